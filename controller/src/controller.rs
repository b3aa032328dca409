// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Implementation of the main controller logic.

use crate::config::Config;
use crate::results::PortResults;
use crate::sysfs;
use crate::sysfs::SysfsEeprom;
use crate::topology::Topology;
use crate::Error;
use eeprom_decode::ModuleInfo;
use eeprom_layout::DeviceKind;
use itertools::Itertools;
use slog::debug;
use slog::error;
use slog::info;
use slog::warn;
use slog::Logger;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A type for reading the EEPROMs on a switch board.
///
/// All operations are synchronous and block on file I/O. Every decode uses
/// its own page cache, so a controller may be shared between threads.
#[derive(Debug)]
pub struct Controller {
    config: Config,
    topology: Topology,
    log: Logger,
}

impl Controller {
    /// Create a new controller.
    pub fn new(config: Config, log: Logger) -> Self {
        let topology = config.topology();
        debug!(
            log,
            "created EEPROM controller";
            "sysfs_root" => %config.sysfs_root.display(),
            "board_id" => %config.board_id,
        );
        Self {
            config,
            topology,
            log,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Return the sysfs directory of the device at `port`.
    pub fn device_path(&self, kind: DeviceKind, port: u8) -> Result<PathBuf, Error> {
        let bus = self.topology.bus_for(kind, port)?;
        Ok(sysfs::device_path(&self.config.sysfs_root, bus, kind.address()))
    }

    /// Return a handle to the EEPROM of the device at `port`.
    ///
    /// This does not check that the device exists.
    pub fn eeprom(&self, kind: DeviceKind, port: u8) -> Result<SysfsEeprom, Error> {
        self.device_path(kind, port).map(SysfsEeprom::new)
    }

    /// Register every device of every kind with its kernel driver.
    ///
    /// Devices that already exist are left alone. The first failure stops
    /// registration and is returned.
    pub fn init(&self) -> Result<(), Error> {
        for kind in [DeviceKind::Cpu, DeviceKind::Qsfp, DeviceKind::QsfpDd] {
            self.init_kind(kind).inspect_err(|e| {
                error!(self.log, "failed to register EEPROMs"; "kind" => %kind, "reason" => %e);
            })?;
        }
        Ok(())
    }

    fn init_kind(&self, kind: DeviceKind) -> Result<(), Error> {
        let log = self.log.new(slog::o!("kind" => kind.name()));
        for port in kind.ports() {
            let bus = self.topology.bus_for(kind, port)?;
            let created =
                sysfs::register_device(&self.config.sysfs_root, bus, kind.address(), kind.driver())?;
            let path = sysfs::device_path(&self.config.sysfs_root, bus, kind.address());
            info!(
                log,
                "EEPROM registered";
                "port" => port,
                "path" => %path.display(),
                "created" => created,
            );
        }
        Ok(())
    }

    /// Return the sysfs directory of every device, by kind and then port.
    pub fn sysfs_paths(&self) -> Result<BTreeMap<DeviceKind, Vec<PathBuf>>, Error> {
        [DeviceKind::Cpu, DeviceKind::Qsfp, DeviceKind::QsfpDd]
            .into_iter()
            .map(|kind| {
                let paths = kind
                    .ports()
                    .map(|port| self.device_path(kind, port))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((kind, paths))
            })
            .collect()
    }

    /// Return the raw contents of the EEPROM at `port`.
    pub fn dump_raw(&self, kind: DeviceKind, port: u8) -> Result<Vec<u8>, Error> {
        let eeprom = self.eeprom(kind, port)?;
        eeprom_decode::dump_raw(&eeprom).map_err(|e| {
            warn!(
                self.log,
                "failed to dump EEPROM";
                "kind" => %kind,
                "port" => port,
                "reason" => %e,
            );
            Error::from(e)
        })
    }

    /// Decode the transceiver at `port`.
    pub fn module_info(&self, kind: DeviceKind, port: u8) -> Result<ModuleInfo, Error> {
        let eeprom = self.eeprom(kind, port)?;
        let info = eeprom_decode::decode(kind, &eeprom)?;
        debug!(
            self.log,
            "decoded module";
            "kind" => %kind,
            "port" => port,
            "revision" => info.revision(),
            "vendor" => info.vendor(),
            "serial" => info.serial(),
        );
        Ok(info)
    }

    /// Decode the QSFP transceiver at `port`.
    pub fn qsfp_info(&self, port: u8) -> Result<ModuleInfo, Error> {
        self.module_info(DeviceKind::Qsfp, port)
    }

    /// Decode the QSFP-DD transceiver at `port`.
    pub fn qsfpdd_info(&self, port: u8) -> Result<ModuleInfo, Error> {
        self.module_info(DeviceKind::QsfpDd, port)
    }

    /// Decode the transceivers at every port of `kind`.
    ///
    /// Failures, including empty cages, are collected per port. An error is
    /// only returned if `kind` has no decoder at all.
    pub fn all_module_info(&self, kind: DeviceKind) -> Result<PortResults<ModuleInfo>, Error> {
        self.module_info_for(kind, kind.ports())
    }

    /// Decode the transceivers at each of `ports`.
    pub fn module_info_for(
        &self,
        kind: DeviceKind,
        ports: impl IntoIterator<Item = u8>,
    ) -> Result<PortResults<ModuleInfo>, Error> {
        if kind == DeviceKind::Cpu {
            return Err(eeprom_decode::Error::NoDecoder(kind).into());
        }
        let mut results = PortResults::new(kind);
        results.extend(ports.into_iter().map(|port| (port, self.module_info(kind, port))));
        if !results.failures().is_empty() {
            warn!(
                self.log,
                "failed to decode some modules";
                "kind" => %kind,
                "ports" => results.error_iter().map(|(port, _)| port).join(","),
            );
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::Controller;
    use crate::config::ConfigBuilder;
    use crate::mock::qsfp_image;
    use crate::mock::MockSysfs;
    use crate::test_utils::test_logger;
    use crate::topology::MuxBuses;
    use crate::Error;
    use eeprom_decode::Error as DecodeError;
    use eeprom_decode::ModuleInfo;
    use eeprom_layout::BoardId;
    use eeprom_layout::DeviceKind;
    use std::fs;
    use tempfile::TempDir;

    const BASE: u32 = 10;

    fn setup(board_id: BoardId) -> (TempDir, MockSysfs, Controller) {
        let root = tempfile::tempdir().unwrap();
        let config = ConfigBuilder::new()
            .sysfs_root(root.path())
            .board_id(board_id)
            .mux_buses(MuxBuses::contiguous(BASE))
            .build()
            .unwrap();
        let mock = MockSysfs::new(root.path(), config.topology());
        let controller = Controller::new(config, test_logger());
        (root, mock, controller)
    }

    fn alpha() -> BoardId {
        BoardId(BoardId::NCP1_1_ALPHA)
    }

    #[test]
    fn test_init_registers_every_device() {
        let (root, mock, controller) = setup(alpha());
        for kind in [DeviceKind::Cpu, DeviceKind::Qsfp, DeviceKind::QsfpDd] {
            for port in kind.ports() {
                mock.add_bus(kind, port).unwrap();
            }
        }
        controller.init().unwrap();

        let cpu = fs::read_to_string(root.path().join("i2c-0/new_device")).unwrap();
        assert_eq!(cpu, "mb_eeprom 0x57");
        // QSFP-DD port 12 is on mux QsfpDd1, channel 4.
        let dd = fs::read_to_string(root.path().join("i2c-30/new_device")).unwrap();
        assert_eq!(dd, "optoe3 0x50");
        // QSFP port 20 is on mux Qsfp2, channel 5.
        let qsfp = fs::read_to_string(root.path().join("i2c-55/new_device")).unwrap();
        assert_eq!(qsfp, "sff8436 0x50");
    }

    #[test]
    fn test_init_skips_existing_devices() {
        let (root, mock, controller) = setup(alpha());
        mock.populate(&[]).unwrap();
        controller.init().unwrap();
        let written = fs::read_to_string(root.path().join("i2c-30/new_device")).unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn test_init_fails_without_bus() {
        let (_root, _mock, controller) = setup(alpha());
        assert!(matches!(controller.init(), Err(Error::Registration { .. })));
    }

    #[test]
    fn test_init_invalid_board() {
        let (_root, mock, controller) = setup(BoardId(0b1000));
        mock.add_bus(DeviceKind::Cpu, 0).unwrap();
        for port in DeviceKind::Qsfp.ports() {
            mock.add_bus(DeviceKind::Qsfp, port).unwrap();
        }
        assert!(matches!(controller.init(), Err(Error::InvalidBoardId(_))));
    }

    #[test]
    fn test_sysfs_paths() {
        let (root, _mock, controller) = setup(alpha());
        let paths = controller.sysfs_paths().unwrap();
        assert_eq!(paths[&DeviceKind::Cpu], vec![root.path().join("0-0057")]);
        assert_eq!(paths[&DeviceKind::Qsfp].len(), 40);
        assert_eq!(paths[&DeviceKind::Qsfp][20], root.path().join("55-0050"));
        assert_eq!(paths[&DeviceKind::QsfpDd].len(), 13);
        assert_eq!(paths[&DeviceKind::QsfpDd][12], root.path().join("30-0050"));
    }

    #[test]
    fn test_dump_raw() {
        let (_root, mock, controller) = setup(alpha());
        mock.add_device(DeviceKind::Qsfp, 4, &qsfp_image(4)).unwrap();
        assert_eq!(controller.dump_raw(DeviceKind::Qsfp, 4).unwrap(), qsfp_image(4));
        assert!(matches!(
            controller.dump_raw(DeviceKind::Qsfp, 5),
            Err(Error::Decode(DecodeError::DeviceNotPresent))
        ));
        assert!(matches!(
            controller.dump_raw(DeviceKind::Qsfp, 40),
            Err(Error::Layout(_))
        ));
    }

    #[test]
    fn test_module_info() {
        let (_root, mock, controller) = setup(alpha());
        mock.populate(&[]).unwrap();

        let info = controller.qsfp_info(0).unwrap();
        assert_eq!(info.temperature(), Some(25.0));
        assert_eq!(info.supply_voltage(), Some(3.3));
        assert_eq!(info.vendor(), Some("UFISPACE MOCK"));
        assert_eq!(info.serial(), Some("QSFP0000"));
        assert_eq!(info.receiver_power(), &[Some(0.4), Some(0.41), Some(0.42), Some(0.43)]);
        assert_eq!(info.transmitter_bias_current(), &[Some(6.0); 4]);

        let info = controller.qsfpdd_info(0).unwrap();
        assert_eq!(info.revision(), Some("3.0"));
        assert_eq!(info.temperature(), Some(40.0));
        assert_eq!(info.serial(), Some("QSFPDD0000"));
        assert_eq!(info.transmitter_power(), Some([Some(1.0); 8].as_slice()));
        assert_eq!(info.receiver_power(), &[Some(0.8); 8]);

        let info = controller.qsfpdd_info(1).unwrap();
        assert_eq!(info.revision(), Some("2.0"));
        assert_eq!(info.transmitter_bias_current(), &[Some(8.0); 8]);
    }

    #[test]
    fn test_cpu_has_no_decoder() {
        let (_root, mock, controller) = setup(alpha());
        mock.populate(&[]).unwrap();
        assert!(matches!(
            controller.module_info(DeviceKind::Cpu, 0),
            Err(Error::Decode(DecodeError::NoDecoder(DeviceKind::Cpu)))
        ));
        assert!(controller.all_module_info(DeviceKind::Cpu).is_err());
        assert_eq!(controller.dump_raw(DeviceKind::Cpu, 0).unwrap().len(), 256);
    }

    #[test]
    fn test_all_module_info_collects_failures() {
        let (_root, mock, controller) = setup(alpha());
        mock.populate(&[(DeviceKind::QsfpDd, 2), (DeviceKind::QsfpDd, 7)])
            .unwrap();

        let results = controller.all_module_info(DeviceKind::QsfpDd).unwrap();
        assert_eq!(results.kind, DeviceKind::QsfpDd);
        assert_eq!(results.len(), 11);
        assert_eq!(
            results.error_iter().map(|(port, _)| port).collect::<Vec<_>>(),
            vec![2, 7]
        );
        assert!(matches!(
            results.nth_err(2),
            Some(Error::Decode(DecodeError::DeviceNotPresent))
        ));
        assert!(matches!(results.nth(12), Some(ModuleInfo::QsfpDd(_))));
    }

    #[test]
    fn test_module_info_for_ports() {
        let (_root, mock, controller) = setup(alpha());
        mock.populate(&[]).unwrap();
        let results = controller.module_info_for(DeviceKind::Qsfp, [3, 41]).unwrap();
        assert_eq!(results.iter().map(|(port, _)| port).collect::<Vec<_>>(), vec![3]);
        assert!(matches!(results.nth_err(41), Some(Error::Layout(_))));
    }
}
