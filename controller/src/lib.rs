// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! A host-side interface for reading the board and transceiver EEPROMs of a
//! switch through the Linux I2C sysfs interface.

pub mod beacon;
pub mod config;
mod controller;
pub mod mock;
mod results;
pub mod sysfs;
pub mod topology;

pub use crate::beacon::BeaconLed;
pub use crate::beacon::SegmentDisplay;
pub use crate::config::Config;
pub use crate::config::ConfigBuilder;
pub use crate::controller::Controller;
pub use crate::results::FailedPorts;
pub use crate::results::PortResults;
pub use crate::sysfs::SysfsEeprom;
pub use crate::topology::Mux;
pub use crate::topology::MuxBuses;
pub use crate::topology::Topology;
pub use eeprom_decode::ModuleInfo;
pub use eeprom_layout::BoardId;
pub use eeprom_layout::DeviceKind;

use std::path::PathBuf;
use thiserror::Error;

/// An error related to managing device EEPROMs.
#[derive(Debug, Error)]
pub enum Error {
    /// The board ID does not match any known wiring.
    #[error("Invalid board ID: {0}")]
    InvalidBoardId(BoardId),

    #[error("Sysfs root {} is not a directory", .0.display())]
    BadSysfsRoot(PathBuf),

    /// Writing to a bus's `new_device` file failed.
    #[error("Failed to register {driver} device via {}", .path.display())]
    Registration {
        driver: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] eeprom_decode::Error),

    #[error(transparent)]
    Layout(#[from] eeprom_layout::Error),

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod test_utils {
    use slog::Logger;

    pub fn test_logger() -> Logger {
        Logger::root(slog::Discard, slog::o!())
    }
}
