// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Configuration of the EEPROM controller.

pub use crate::sysfs::default_sysfs_root;
use crate::topology::MuxBuses;
use crate::topology::Topology;
use crate::Error;
use eeprom_layout::BoardId;
use std::path::PathBuf;

/// Return the default board ID, that of the first production-wiring build.
pub const fn default_board_id() -> BoardId {
    BoardId(BoardId::NCP1_1_ALPHA)
}

/// Configuration for a [`crate::Controller`].
///
/// The [`ConfigBuilder`] can be used to construct this with defaults that work
/// on a stock switch.
#[derive(Clone, Debug)]
pub struct Config {
    /// The directory containing I2C devices in sysfs.
    pub sysfs_root: PathBuf,

    /// The identity of the main board, which selects the QSFP-DD wiring.
    pub board_id: BoardId,

    /// The bus numbers assigned to each mux channel.
    pub mux_buses: MuxBuses,
}

impl Config {
    /// Return the bus topology described by this configuration.
    pub fn topology(&self) -> Topology {
        Topology::new(self.board_id, self.mux_buses)
    }
}

/// A builder interface for generating controller configuration.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    sysfs_root: Option<PathBuf>,
    board_id: Option<BoardId>,
    mux_buses: Option<MuxBuses>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sysfs directory containing I2C devices.
    pub fn sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = Some(root.into());
        self
    }

    /// Set the board ID.
    pub fn board_id(mut self, board_id: BoardId) -> Self {
        self.board_id = Some(board_id);
        self
    }

    /// Set the bus numbers of the mux channels.
    pub fn mux_buses(mut self, buses: MuxBuses) -> Self {
        self.mux_buses = Some(buses);
        self
    }

    /// Build a `Config` from `self`.
    ///
    /// The sysfs root must be an existing directory.
    pub fn build(self) -> Result<Config, Error> {
        let sysfs_root = self.sysfs_root.unwrap_or_else(default_sysfs_root);
        if !sysfs_root.is_dir() {
            return Err(Error::BadSysfsRoot(sysfs_root));
        }
        Ok(Config {
            sysfs_root,
            board_id: self.board_id.unwrap_or_else(default_board_id),
            mux_buses: self.mux_buses.unwrap_or_default(),
        })
    }
}
