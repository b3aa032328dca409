// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Resolve the I2C bus behind each device.
//!
//! Transceiver EEPROMs sit behind 8-channel I2C multiplexers. Each mux channel
//! appears to the kernel as its own bus, numbered when the mux driver is
//! bound. Which mux serves a port depends on the device kind and, for QSFP-DD
//! cages, on the board revision.

use crate::Error;
use eeprom_layout::BoardId;
use eeprom_layout::DeviceKind;
use std::fmt;

/// The bus on which the CPU board EEPROM lives.
pub const CPU_EEPROM_BUS: u32 = 0;

/// The number of channels on each multiplexer.
pub const MUX_CHANNELS: u8 = 8;

// The highest front-panel QSFP port that is wired straight through.
const QSFP_LAST_STRAIGHT_PORT: u8 = 19;

/// A multiplexer fanning out to transceiver cages.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Mux {
    QsfpDdBoard,
    QsfpDd0,
    QsfpDd1,
    Qsfp0,
    Qsfp1,
    Qsfp2,
    Qsfp3,
    Qsfp4,
}

impl Mux {
    /// Every mux, in bus enumeration order.
    pub const ALL: [Mux; 8] = [
        Mux::QsfpDdBoard,
        Mux::QsfpDd0,
        Mux::QsfpDd1,
        Mux::Qsfp0,
        Mux::Qsfp1,
        Mux::Qsfp2,
        Mux::Qsfp3,
        Mux::Qsfp4,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Mux {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single channel of a mux.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MuxChannel {
    pub mux: Mux,
    pub channel: u8,
}

/// The bus number of the first channel of every mux.
///
/// Channels of one mux are numbered consecutively from that bus.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MuxBuses {
    first_bus: [u32; Mux::ALL.len()],
}

impl MuxBuses {
    /// Number the muxes back-to-back starting at `base`, in the order of
    /// [`Mux::ALL`].
    pub const fn contiguous(base: u32) -> Self {
        let mut first_bus = [0; Mux::ALL.len()];
        let mut i = 0;
        while i < first_bus.len() {
            first_bus[i] = base + (i as u32) * MUX_CHANNELS as u32;
            i += 1;
        }
        Self { first_bus }
    }

    /// Override the first bus of one mux.
    pub const fn with_mux(mut self, mux: Mux, first_bus: u32) -> Self {
        self.first_bus[mux.index()] = first_bus;
        self
    }

    /// Return the bus number of a mux channel.
    pub const fn bus(&self, channel: MuxChannel) -> u32 {
        self.first_bus[channel.mux.index()] + channel.channel as u32
    }
}

/// Return the first bus created for the muxes on a stock kernel, after the
/// root and controller buses.
pub const fn default_mux_bus_base() -> u32 {
    10
}

impl Default for MuxBuses {
    fn default() -> Self {
        Self::contiguous(default_mux_bus_base())
    }
}

/// Map a front-panel QSFP port to its physical port.
///
/// The first 20 ports are wired straight through. Above that, each pair of
/// neighbouring ports is swapped.
pub const fn qsfp_fp_to_phy(port: u8) -> u8 {
    if port <= QSFP_LAST_STRAIGHT_PORT {
        port
    } else if port % 2 == 0 {
        port + 1
    } else {
        port - 1
    }
}

/// The wiring of a particular board.
#[derive(Clone, Copy, Debug)]
pub struct Topology {
    board_id: BoardId,
    buses: MuxBuses,
}

impl Topology {
    pub const fn new(board_id: BoardId, buses: MuxBuses) -> Self {
        Self { board_id, buses }
    }

    pub const fn board_id(&self) -> BoardId {
        self.board_id
    }

    /// Return the mux channel serving a transceiver port.
    ///
    /// The CPU EEPROM is not behind a mux, and yields `None`.
    pub fn mux_channel(&self, kind: DeviceKind, port: u8) -> Result<Option<MuxChannel>, Error> {
        kind.check_port(port)?;
        let channel = match kind {
            DeviceKind::Cpu => return Ok(None),
            DeviceKind::Qsfp => {
                let phy = qsfp_fp_to_phy(port);
                let mux = match phy / MUX_CHANNELS {
                    0 => Mux::Qsfp0,
                    1 => Mux::Qsfp1,
                    2 => Mux::Qsfp2,
                    3 => Mux::Qsfp3,
                    _ => Mux::Qsfp4,
                };
                MuxChannel {
                    mux,
                    channel: phy % MUX_CHANNELS,
                }
            }
            DeviceKind::QsfpDd => {
                let mux = if self.board_id == BoardId::NCP1_1_PROTO {
                    // Four cages per group on prototypes, but the channel
                    // still wraps every eight ports.
                    match port / 4 {
                        0 => Mux::QsfpDdBoard,
                        1 => Mux::QsfpDd0,
                        _ => Mux::QsfpDd1,
                    }
                } else if self.board_id.build_revision() >= BoardId::NCP1_1_ALPHA {
                    match port / MUX_CHANNELS {
                        0 => Mux::QsfpDd0,
                        _ => Mux::QsfpDd1,
                    }
                } else {
                    return Err(Error::InvalidBoardId(self.board_id));
                };
                MuxChannel {
                    mux,
                    channel: port % MUX_CHANNELS,
                }
            }
        };
        Ok(Some(channel))
    }

    /// Return the bus number of the device at `port`.
    pub fn bus_for(&self, kind: DeviceKind, port: u8) -> Result<u32, Error> {
        Ok(self
            .mux_channel(kind, port)?
            .map_or(CPU_EEPROM_BUS, |channel| self.buses.bus(channel)))
    }
}
