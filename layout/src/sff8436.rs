// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Register table for QSFP modules conforming to SFF-8436.
//!
//! Monitors live in the lower page (block 0), vendor identity in upper page 0
//! (block 1).

use crate::register::Field;
use crate::register::FieldWidth;
use crate::register::Layout;
use crate::register::RegisterField;

/// The number of optical lanes on a QSFP module.
pub const CHANNEL_COUNT: u8 = 4;

/// Page slots reserved by readers of this table.
pub const PAGE_SLOTS: usize = 5;

/// The length of the vendor name and serial number strings.
pub const ASCII_LEN: u8 = 16;

const LANES: FieldWidth = FieldWidth::Word {
    repeat: CHANNEL_COUNT,
};
const TEXT: FieldWidth = FieldWidth::Ascii { len: ASCII_LEN };

pub const LAYOUT: Layout = Layout {
    fields: &[
        (Field::Temperature, RegisterField::new(0, 22, FieldWidth::WORD)),
        (Field::SupplyVoltage, RegisterField::new(0, 26, FieldWidth::WORD)),
        (Field::VendorName, RegisterField::new(1, 20, TEXT)),
        (Field::SerialNumber, RegisterField::new(1, 68, TEXT)),
        (Field::TxBias, RegisterField::new(0, 42, LANES)),
        (Field::RxPower, RegisterField::new(0, 34, LANES)),
    ],
    channel_count: CHANNEL_COUNT,
    page_slots: PAGE_SLOTS,
};

static_assertions::const_assert!(LAYOUT.is_consistent());
