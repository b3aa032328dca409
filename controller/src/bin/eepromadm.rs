// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;
use eeprom_controller::config::default_board_id;
use eeprom_controller::config::default_sysfs_root;
use eeprom_controller::topology::default_mux_bus_base;
use eeprom_controller::BeaconLed;
use eeprom_controller::BoardId;
use eeprom_controller::ConfigBuilder;
use eeprom_controller::Controller;
use eeprom_controller::DeviceKind;
use eeprom_controller::Error;
use eeprom_controller::ModuleInfo;
use eeprom_controller::MuxBuses;
use eeprom_controller::PortResults;
use eeprom_controller::SegmentDisplay;
use eeprom_layout::beacon::Segments;
use itertools::Itertools;
use slog::Drain;
use slog::Level;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::settings::Style;
use tabled::Table;
use tabled::Tabled;

fn parse_log_level(s: &str) -> Result<Level, String> {
    s.parse().map_err(|_| String::from("invalid log level"))
}

/// Inspect the board and transceiver EEPROMs of a switch.
///
/// This tool reads devices through the kernel's I2C sysfs interface. It can
/// register the EEPROM drivers, dump raw contents, and decode identity and
/// monitoring data from QSFP and QSFP-DD transceivers.
#[derive(Parser)]
#[command(version, about, long_about)]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,

    /// The sysfs directory containing I2C devices.
    #[arg(short, long, default_value_os_t = default_sysfs_root())]
    sysfs_root: PathBuf,

    /// The board ID, in decimal or 0x-prefixed hex.
    ///
    /// This selects the QSFP-DD mux wiring.
    #[arg(short, long, default_value_t = default_board_id())]
    board_id: BoardId,

    /// The bus number of the first channel of the first transceiver mux.
    ///
    /// The remaining mux channels are assumed to be numbered consecutively.
    #[arg(short, long, default_value_t = default_mux_bus_base())]
    mux_bus_base: u32,

    /// The log-level.
    #[arg(
        short,
        long,
        default_value_t = Level::Info,
        value_parser = parse_log_level
    )]
    log_level: Level,
}

#[derive(Subcommand)]
enum Cmd {
    /// Register every EEPROM with its kernel driver.
    Init,

    /// Print the sysfs directory of every EEPROM.
    Paths,

    /// Print the raw contents of one EEPROM as a hex dump.
    Dump {
        #[arg(value_enum)]
        kind: DeviceKind,
        port: u8,
    },

    /// Decode the transceivers of a kind.
    Info {
        #[arg(value_enum)]
        kind: DeviceKind,

        /// The ports to decode. The default is every port.
        ports: Vec<u8>,

        /// Print JSON rather than a table.
        #[arg(long)]
        json: bool,
    },

    /// Show a value on the beacon LED, as two hex digits.
    ///
    /// The segment line levels for each digit are printed.
    Beacon { value: u8 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog::LevelFilter::new(drain, args.log_level).fuse();
    let log = slog::Logger::root(drain, slog::o!());

    let config = ConfigBuilder::new()
        .sysfs_root(args.sysfs_root)
        .board_id(args.board_id)
        .mux_buses(MuxBuses::contiguous(args.mux_bus_base))
        .build()
        .context("invalid configuration")?;
    let controller = Arc::new(Controller::new(config, log.new(slog::o!("name" => "controller"))));

    match args.cmd {
        Cmd::Init => controller.init().context("failed to register EEPROMs")?,
        Cmd::Paths => print_paths(controller.sysfs_paths()?),
        Cmd::Dump { kind, port } => {
            let data = controller
                .dump_raw(kind, port)
                .with_context(|| format!("failed to dump {kind} EEPROM {port}"))?;
            print_hex_dump(&data);
        }
        Cmd::Info { kind, ports, json } => {
            anyhow::ensure!(
                kind != DeviceKind::Cpu,
                "{kind} EEPROMs can only be dumped, not decoded"
            );
            let ports = if ports.is_empty() {
                kind.ports().collect()
            } else {
                ports
            };
            let results = module_info(controller, kind, ports).await?;
            if json {
                print_info_json(&results)?;
            } else {
                print_info_table(&results);
            }
        }
        Cmd::Beacon { value } => {
            let mut led = BeaconLed::new(PrintDisplay, log.new(slog::o!("name" => "beacon")));
            led.set(value)?;
        }
    }
    Ok(())
}

// Decode each port on its own blocking task.
async fn module_info(
    controller: Arc<Controller>,
    kind: DeviceKind,
    ports: Vec<u8>,
) -> anyhow::Result<PortResults<ModuleInfo>> {
    let tasks: Vec<_> = ports
        .into_iter()
        .map(|port| {
            let controller = controller.clone();
            tokio::task::spawn_blocking(move || (port, controller.module_info(kind, port)))
        })
        .collect();
    let mut results = PortResults::new(kind);
    for task in tasks {
        let (port, result) = task.await?;
        results.insert(port, result);
    }
    Ok(results)
}

// A beacon that only prints the levels it would drive.
struct PrintDisplay;

impl SegmentDisplay for PrintDisplay {
    fn set_segments(&mut self, left: Segments, right: Segments) -> Result<(), Error> {
        println!("Left  {:?}", left.levels());
        println!("Right {:?}", right.levels());
        Ok(())
    }
}

// Render an error and all of its sources on one line.
fn error_chain(err: &Error) -> String {
    std::iter::successors(Some(err as &dyn std::error::Error), |e| e.source())
        .map(|e| e.to_string())
        .join(": ")
}

const NA: &str = "n/a";

fn fmt_value(value: Option<f32>) -> String {
    value.map_or_else(|| String::from(NA), |v| format!("{v:.2}"))
}

fn fmt_lanes(values: Option<&[Option<f32>]>) -> String {
    match values {
        Some(values) => values.iter().map(|v| fmt_value(*v)).join(" "),
        None => String::from(NA),
    }
}

#[derive(Tabled)]
struct PathRow {
    #[tabled(rename = "Kind")]
    kind: DeviceKind,
    #[tabled(rename = "Port")]
    port: usize,
    #[tabled(rename = "Path")]
    path: String,
}

fn print_paths(paths: BTreeMap<DeviceKind, Vec<PathBuf>>) {
    let rows = paths.into_iter().flat_map(|(kind, paths)| {
        paths.into_iter().enumerate().map(move |(port, path)| PathRow {
            kind,
            port,
            path: path.display().to_string(),
        })
    });
    println!("{}", Table::new(rows).with(Style::psql()));
}

// Bytes per line of a hex dump.
const DUMP_WIDTH: usize = 16;

fn print_hex_dump(data: &[u8]) {
    for (i, chunk) in data.chunks(DUMP_WIDTH).enumerate() {
        let hex = chunk.iter().map(|b| format!("{b:02x}")).join(" ");
        let ascii: String = chunk
            .iter()
            .map(|b| {
                if b.is_ascii_graphic() || *b == b' ' {
                    char::from(*b)
                } else {
                    '.'
                }
            })
            .collect();
        println!(
            "{:08x}  {hex:<width$}  |{ascii}|",
            i * DUMP_WIDTH,
            width = DUMP_WIDTH * 3 - 1
        );
    }
}

#[derive(Tabled)]
struct InfoRow {
    #[tabled(rename = "Port")]
    port: u8,
    #[tabled(rename = "Rev")]
    revision: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Temp (C)")]
    temperature: String,
    #[tabled(rename = "Vcc (V)")]
    supply_voltage: String,
    #[tabled(rename = "Tx bias (mA)")]
    tx_bias: String,
    #[tabled(rename = "Tx power (mW)")]
    tx_power: String,
    #[tabled(rename = "Rx power (mW)")]
    rx_power: String,
}

impl InfoRow {
    fn new(port: u8, info: &ModuleInfo) -> Self {
        Self {
            port,
            revision: info.revision().unwrap_or("-").to_string(),
            vendor: info.vendor().unwrap_or(NA).to_string(),
            serial: info.serial().unwrap_or(NA).to_string(),
            temperature: fmt_value(info.temperature()),
            supply_voltage: fmt_value(info.supply_voltage()),
            tx_bias: fmt_lanes(Some(info.transmitter_bias_current())),
            tx_power: fmt_lanes(info.transmitter_power()),
            rx_power: fmt_lanes(Some(info.receiver_power())),
        }
    }
}

fn print_info_table(results: &PortResults<ModuleInfo>) {
    let rows = results.iter().map(|(port, info)| InfoRow::new(port, info));
    println!("{}", Table::new(rows).with(Style::psql()));
    for (port, err) in results.error_iter() {
        eprintln!("{} port {port}: {}", results.kind, error_chain(err));
    }
}

#[derive(serde::Serialize)]
struct InfoReport<'a> {
    kind: DeviceKind,
    modules: BTreeMap<u8, &'a ModuleInfo>,
    failures: BTreeMap<u8, String>,
}

fn print_info_json(results: &PortResults<ModuleInfo>) -> anyhow::Result<()> {
    let report = InfoReport {
        kind: results.kind,
        modules: results.iter().collect(),
        failures: results
            .error_iter()
            .map(|(port, err)| (port, error_chain(err)))
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
