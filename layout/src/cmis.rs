// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Register tables for QSFP-DD modules conforming to the Common Management
//! Interface Specification (CMIS).
//!
//! The layout moved substantially between revisions 2.0 and 3.0. In 3.0 the
//! per-lane monitors live in banked page 0x11, which appears as block 18 of the
//! linear EEPROM image.

use crate::register::Field;
use crate::register::FieldWidth;
use crate::register::Layout;
use crate::register::RegisterField;

/// The number of optical lanes on a QSFP-DD module.
pub const CHANNEL_COUNT: u8 = 8;

/// Page slots reserved by readers of these tables.
pub const PAGE_SLOTS: usize = 257;

/// The length of the vendor name and serial number strings.
pub const ASCII_LEN: u8 = 16;

/// The location of the revision byte, common to every revision.
pub const REVISION: RegisterField = RegisterField::new(0, 1, FieldWidth::Byte);

const LANES: FieldWidth = FieldWidth::Word {
    repeat: CHANNEL_COUNT,
};
const TEXT: FieldWidth = FieldWidth::Ascii { len: ASCII_LEN };

/// CMIS revision 2.0.
pub const REV_2_0: Layout = Layout {
    fields: &[
        (Field::Revision, REVISION),
        (Field::Temperature, RegisterField::new(0, 26, FieldWidth::WORD)),
        (Field::SupplyVoltage, RegisterField::new(0, 30, FieldWidth::WORD)),
        (Field::VendorName, RegisterField::new(1, 20, TEXT)),
        (Field::SerialNumber, RegisterField::new(1, 68, TEXT)),
        (Field::TxPower, RegisterField::new(0, 64, LANES)),
        (Field::TxBias, RegisterField::new(0, 48, LANES)),
        (Field::RxPower, RegisterField::new(0, 32, LANES)),
    ],
    channel_count: CHANNEL_COUNT,
    page_slots: PAGE_SLOTS,
};

/// CMIS revision 3.0.
pub const REV_3_0: Layout = Layout {
    fields: &[
        (Field::Revision, REVISION),
        (Field::Temperature, RegisterField::new(0, 14, FieldWidth::WORD)),
        (Field::SupplyVoltage, RegisterField::new(0, 16, FieldWidth::WORD)),
        (Field::VendorName, RegisterField::new(1, 1, TEXT)),
        (Field::SerialNumber, RegisterField::new(1, 38, TEXT)),
        (Field::TxPower, RegisterField::new(18, 26, LANES)),
        (Field::TxBias, RegisterField::new(18, 42, LANES)),
        (Field::RxPower, RegisterField::new(18, 58, LANES)),
    ],
    channel_count: CHANNEL_COUNT,
    page_slots: PAGE_SLOTS,
};

static_assertions::const_assert!(REV_2_0.is_consistent());
static_assertions::const_assert!(REV_3_0.is_consistent());

#[cfg(test)]
mod tests {
    use super::REV_2_0;
    use super::REV_3_0;
    use crate::register::Field;
    use crate::register::FieldWidth;
    use crate::register::Layout;
    use crate::register::RegisterField;

    const LANES: FieldWidth = FieldWidth::Word { repeat: 8 };
    const TEXT: FieldWidth = FieldWidth::Ascii { len: 16 };

    fn check(layout: &Layout, expected: &[(Field, u8, u8, FieldWidth)]) {
        assert_eq!(layout.fields.len(), expected.len());
        for &(field, page, offset, width) in expected {
            assert_eq!(
                layout.field(field),
                Some(RegisterField::new(page, offset, width)),
                "{field:?}"
            );
        }
        assert_eq!(layout.channel_count, 8);
    }

    #[test]
    fn test_cmis_2_0_locations() {
        check(
            &REV_2_0,
            &[
                (Field::Revision, 0, 1, FieldWidth::Byte),
                (Field::Temperature, 0, 26, FieldWidth::WORD),
                (Field::SupplyVoltage, 0, 30, FieldWidth::WORD),
                (Field::VendorName, 1, 20, TEXT),
                (Field::SerialNumber, 1, 68, TEXT),
                (Field::TxPower, 0, 64, LANES),
                (Field::TxBias, 0, 48, LANES),
                (Field::RxPower, 0, 32, LANES),
            ],
        );
    }

    #[test]
    fn test_cmis_3_0_locations() {
        check(
            &REV_3_0,
            &[
                (Field::Revision, 0, 1, FieldWidth::Byte),
                (Field::Temperature, 0, 14, FieldWidth::WORD),
                (Field::SupplyVoltage, 0, 16, FieldWidth::WORD),
                (Field::VendorName, 1, 1, TEXT),
                (Field::SerialNumber, 1, 38, TEXT),
                (Field::TxPower, 18, 26, LANES),
                (Field::TxBias, 18, 42, LANES),
                (Field::RxPower, 18, 58, LANES),
            ],
        );
    }
}
