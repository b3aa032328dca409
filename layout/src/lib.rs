// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Static descriptions of the EEPROMs on a switch board: which devices exist,
//! where their fields live in the memory map, and how the beacon LED draws its
//! digits.

pub mod beacon;
pub mod cmis;
pub mod register;
pub mod sff8436;

pub use register::Field;
pub use register::FieldWidth;
pub use register::Layout;
pub use register::RegisterField;
pub use register::RegisterTable;

use serde::Deserialize;
use serde::Serialize;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// The size of a single block read from a device EEPROM.
///
/// Page `n` of a module's memory map starts at byte `n * BLOCK_SIZE` of the
/// linear image exposed by the kernel EEPROM driver.
pub const BLOCK_SIZE: usize = 128;

/// The number of QSFP ports on the front panel.
pub const QSFP_PORT_COUNT: u8 = 40;

/// The number of QSFP-DD ports on the front panel.
pub const QSFPDD_PORT_COUNT: u8 = 13;

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// A raw device type outside of the known set.
    #[error("Invalid device type: {0}")]
    InvalidDeviceKind(u8),

    /// A port index beyond the number of ports of a device kind.
    #[error("Invalid port {port} for {kind} devices")]
    InvalidPort { kind: DeviceKind, port: u8 },

    /// A page index beyond the page slots of a register table.
    #[error("Page {page} is out of range for the {table} register table")]
    InvalidPage { table: RegisterTable, page: u8 },
}

/// The kinds of EEPROM devices on the board.
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
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "api-traits", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DeviceKind {
    /// The CPU board EEPROM.
    Cpu = 0,
    /// A QSFP transceiver, SFF-8436 memory map.
    Qsfp = 1,
    /// A QSFP-DD transceiver, CMIS memory map.
    QsfpDd = 2,
}

impl DeviceKind {
    /// The 7-bit I2C address of the EEPROM.
    pub const fn address(self) -> u8 {
        match self {
            DeviceKind::Cpu => 0x57,
            DeviceKind::Qsfp | DeviceKind::QsfpDd => 0x50,
        }
    }

    /// The name of the kernel driver bound to the EEPROM.
    pub const fn driver(self) -> &'static str {
        match self {
            DeviceKind::Cpu => "mb_eeprom",
            DeviceKind::Qsfp => "sff8436",
            DeviceKind::QsfpDd => "optoe3",
        }
    }

    /// The number of devices of this kind on the board.
    pub const fn port_count(self) -> u8 {
        match self {
            DeviceKind::Cpu => 1,
            DeviceKind::Qsfp => QSFP_PORT_COUNT,
            DeviceKind::QsfpDd => QSFPDD_PORT_COUNT,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DeviceKind::Cpu => "CPU",
            DeviceKind::Qsfp => "QSFP",
            DeviceKind::QsfpDd => "QSFPDD",
        }
    }

    /// Return an error if `port` does not exist for this kind of device.
    pub const fn check_port(self, port: u8) -> Result<(), Error> {
        if port < self.port_count() {
            Ok(())
        } else {
            Err(Error::InvalidPort { kind: self, port })
        }
    }

    /// Return an iterator over every valid port index.
    pub fn ports(self) -> impl Iterator<Item = u8> {
        0..self.port_count()
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<u8> for DeviceKind {
    type Error = Error;

    fn try_from(x: u8) -> Result<Self, Self::Error> {
        match x {
            0 => Ok(DeviceKind::Cpu),
            1 => Ok(DeviceKind::Qsfp),
            2 => Ok(DeviceKind::QsfpDd),
            _ => Err(Error::InvalidDeviceKind(x)),
        }
    }
}

/// The identity of the main board, as read from its board-ID strapping.
///
/// The low bits carry the build revision. Bus topology for some devices
/// depends on it, so it must be passed explicitly to whatever resolves a port
/// to a bus.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[cfg_attr(feature = "api-traits", derive(schemars::JsonSchema))]
pub struct BoardId(pub u8);

impl BoardId {
    pub const BUILD_REV_MASK: u8 = 0b0000_0111;

    /// The prototype build, which has its own QSFP-DD mux arrangement.
    pub const NCP1_1_PROTO: Self = Self(0b000);

    // Build revisions, compared against the masked board ID.
    pub const NCP1_1_ALPHA: u8 = 0b001;
    pub const NCP1_1_BETA: u8 = 0b010;
    pub const NCP1_1_PVT: u8 = 0b011;

    /// Return the build revision bits.
    pub const fn build_revision(self) -> u8 {
        self.0 & Self::BUILD_REV_MASK
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:02x}", self.0)
    }
}

impl FromStr for BoardId {
    type Err = ParseIntError;

    /// Parse a board ID in decimal, or hexadecimal with a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u8::from_str_radix(hex, 16).map(Self),
            None => s.parse().map(Self),
        }
    }
}
