// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Detect which CMIS register table governs a QSFP-DD module.

use crate::field::read_byte;
use eeprom_layout::cmis;
use eeprom_layout::RegisterTable;
use std::fmt;

// Revisions rendering above this select the CMIS 3.0 table.
const CMIS_2_0_HEX: &str = "20";

/// The raw CMIS revision byte of a module.
///
/// The high nibble is the major revision, the low nibble the minor.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Revision(pub u8);

impl Revision {
    /// Read the revision byte from the module's lower page.
    pub fn from_page(page: &[u8]) -> Option<Self> {
        read_byte(page, usize::from(cmis::REVISION.offset)).map(Self)
    }

    /// Return the revision as two uppercase hex digits.
    pub fn hex(self) -> String {
        format!("{:02X}", self.0)
    }

    /// Return the register table to use for this revision.
    pub fn register_table(self) -> RegisterTable {
        // This is a lexical comparison of the hex digits, as deployed tooling
        // has always done. For two uppercase hex digits it orders the same as
        // comparing the raw byte with 0x20.
        if self.hex().as_str() > CMIS_2_0_HEX {
            RegisterTable::Cmis30
        } else {
            RegisterTable::Cmis20
        }
    }

    /// Return the dotted revision label, e.g. `"3.0"`.
    pub fn label(self) -> String {
        let hex = self.hex();
        let (major, minor) = hex.split_at(1);
        format!("{major}.{minor}")
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::Revision;
    use eeprom_layout::RegisterTable;

    #[test]
    fn test_revision_selects_table() {
        assert_eq!(Revision(0x1e).register_table(), RegisterTable::Cmis20);
        assert_eq!(Revision(0x20).register_table(), RegisterTable::Cmis20);
        assert_eq!(Revision(0x21).register_table(), RegisterTable::Cmis30);
        assert_eq!(Revision(0x30).register_table(), RegisterTable::Cmis30);
        assert_eq!(Revision(0x32).register_table(), RegisterTable::Cmis30);
        assert_eq!(Revision(0x2a).register_table(), RegisterTable::Cmis30);
        assert_eq!(Revision(0x00).register_table(), RegisterTable::Cmis20);
    }

    #[test]
    fn test_lexical_order_matches_numeric() {
        for raw in 0..=u8::MAX {
            let expected = if raw > 0x20 {
                RegisterTable::Cmis30
            } else {
                RegisterTable::Cmis20
            };
            assert_eq!(Revision(raw).register_table(), expected, "{raw:#04x}");
        }
    }

    #[test]
    fn test_revision_label() {
        assert_eq!(Revision(0x30).label(), "3.0");
        assert_eq!(Revision(0x32).label(), "3.2");
        assert_eq!(Revision(0x1e).to_string(), "1.E");
        assert_eq!(Revision(0x1e).hex(), "1E");
    }

    #[test]
    fn test_from_page() {
        assert_eq!(Revision::from_page(&[0x18, 0x50]), Some(Revision(0x50)));
        assert_eq!(Revision::from_page(&[0x18]), None);
    }
}
