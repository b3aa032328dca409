// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Locations of named fields within a transceiver's paged memory map.
//!
//! Each supported memory-map standard places the same logical data at
//! different locations. A [`RegisterTable`] names one such standard (and
//! revision), and resolves to a [`Layout`] listing where every field lives as a
//! `(page, offset)` pair, along with how wide it is.
//!
//! Pages here are block indices into the linear EEPROM image, see
//! [`crate::BLOCK_SIZE`]. Offsets are relative to the start of that block.

use crate::cmis;
use crate::sff8436;
use crate::Error;
use crate::BLOCK_SIZE;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// A named field in a transceiver memory map.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// The management interface revision (CMIS only).
    Revision,
    /// Module temperature.
    Temperature,
    /// Module supply voltage.
    SupplyVoltage,
    /// Vendor name.
    VendorName,
    /// Vendor serial number.
    SerialNumber,
    /// Per-lane transmitter output power (CMIS only).
    TxPower,
    /// Per-lane transmitter laser bias current.
    TxBias,
    /// Per-lane receiver input power.
    RxPower,
}

/// The shape of the data stored in a field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldWidth {
    /// A single octet.
    Byte,
    /// Consecutive big-endian 16-bit words, one per channel.
    Word { repeat: u8 },
    /// A space-padded ASCII string.
    Ascii { len: u8 },
}

impl FieldWidth {
    /// A single 16-bit word.
    pub const WORD: Self = FieldWidth::Word { repeat: 1 };

    /// Return the number of octets the field occupies.
    pub const fn len(self) -> usize {
        match self {
            FieldWidth::Byte => 1,
            FieldWidth::Word { repeat } => 2 * repeat as usize,
            FieldWidth::Ascii { len } => len as usize,
        }
    }
}

/// The location of a single field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RegisterField {
    pub page: u8,
    pub offset: u8,
    pub width: FieldWidth,
}

impl RegisterField {
    pub const fn new(page: u8, offset: u8, width: FieldWidth) -> Self {
        Self {
            page,
            offset,
            width,
        }
    }

    /// Return the offset one past the last byte of the field.
    pub const fn end(&self) -> usize {
        self.offset as usize + self.width.len()
    }
}

/// The full set of field locations for one memory-map standard.
#[derive(Debug)]
pub struct Layout {
    pub fields: &'static [(Field, RegisterField)],
    /// The number of optical lanes reported by per-lane fields.
    pub channel_count: u8,
    /// The number of page slots a reader must be able to hold.
    pub page_slots: usize,
}

impl Layout {
    /// Return the location of `field`, if the layout contains it.
    pub fn field(&self, field: Field) -> Option<RegisterField> {
        self.fields
            .iter()
            .find_map(|(f, reg)| (*f == field).then_some(*reg))
    }

    /// Return the distinct pages referenced by the layout, ascending.
    pub fn pages(&self) -> Vec<u8> {
        let mut pages: Vec<_> = self.fields.iter().map(|(_, reg)| reg.page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }

    /// Return true if every field sits within one block, and within the page
    /// slots of the layout.
    ///
    /// This is checked at compile time for each table.
    pub const fn is_consistent(&self) -> bool {
        let mut i = 0;
        while i < self.fields.len() {
            let reg = &self.fields[i].1;
            if reg.end() > BLOCK_SIZE || reg.page as usize >= self.page_slots {
                return false;
            }
            i += 1;
        }
        true
    }
}

/// The register tables known to the decoder.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, strum::EnumIter)]
pub enum RegisterTable {
    /// QSFP, SFF-8436.
    Sff8436,
    /// QSFP-DD, CMIS revision 2.0.
    Cmis20,
    /// QSFP-DD, CMIS revision 3.0 and later.
    Cmis30,
}

impl RegisterTable {
    pub const fn layout(self) -> &'static Layout {
        match self {
            RegisterTable::Sff8436 => &sff8436::LAYOUT,
            RegisterTable::Cmis20 => &cmis::REV_2_0,
            RegisterTable::Cmis30 => &cmis::REV_3_0,
        }
    }

    /// Return an error if `page` cannot be held by this table's page slots.
    pub const fn check_page(self, page: u8) -> Result<(), Error> {
        if (page as usize) < self.layout().page_slots {
            Ok(())
        } else {
            Err(Error::InvalidPage { table: self, page })
        }
    }
}

impl fmt::Display for RegisterTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            RegisterTable::Sff8436 => "SFF-8436",
            RegisterTable::Cmis20 => "CMIS 2.0",
            RegisterTable::Cmis30 => "CMIS 3.0",
        };
        write!(f, "{s}")
    }
}
