// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Build a mock sysfs tree that dummies up board and transceiver EEPROMs.

use anyhow::Context;
use clap::Parser;
use clap::ValueEnum;
use eeprom_controller::config::default_board_id;
use eeprom_controller::mock::MockSysfs;
use eeprom_controller::topology::default_mux_bus_base;
use eeprom_controller::BoardId;
use eeprom_controller::DeviceKind;
use eeprom_controller::MuxBuses;
use eeprom_controller::Topology;
use std::fs;
use std::path::PathBuf;

// Parse an empty cage, as `KIND:PORT`.
fn parse_absent(s: &str) -> Result<(DeviceKind, u8), String> {
    let (kind, port) = s
        .split_once(':')
        .ok_or_else(|| String::from("expected KIND:PORT"))?;
    let kind = DeviceKind::from_str(kind, true)?;
    let port = port.parse().map_err(|e| format!("invalid port: {e}"))?;
    kind.check_port(port).map_err(|e| e.to_string())?;
    Ok((kind, port))
}

/// Populate a directory with a fake I2C sysfs tree.
///
/// Every bus directory gets an empty `new_device` file, and every present
/// device an `eeprom` file with synthetic contents. Point `eepromadm
/// --sysfs-root` at the directory to exercise it without hardware.
#[derive(Parser)]
#[command(version, about, long_about)]
struct Args {
    /// The directory in which to build the tree.
    root: PathBuf,

    /// The board ID whose wiring to mimic.
    #[arg(short, long, default_value_t = default_board_id())]
    board_id: BoardId,

    /// The bus number of the first channel of the first transceiver mux.
    #[arg(short, long, default_value_t = default_mux_bus_base())]
    mux_bus_base: u32,

    /// Comma-separated devices to leave out, as `KIND:PORT`, e.g.
    /// `qsfp-dd:3`.
    #[arg(short, long, use_value_delimiter = true, value_parser = parse_absent)]
    absent: Vec<(DeviceKind, u8)>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    fs::create_dir_all(&args.root)
        .with_context(|| format!("failed to create {}", args.root.display()))?;
    let topology = Topology::new(args.board_id, MuxBuses::contiguous(args.mux_bus_base));
    let mock = MockSysfs::new(&args.root, topology);
    mock.populate(&args.absent)
        .context("failed to populate mock sysfs")?;
    println!("populated {}", mock.root().display());
    Ok(())
}
