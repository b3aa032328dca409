// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Access device EEPROMs through the Linux I2C sysfs interface.

use crate::Error;
use eeprom_decode::EepromDevice;
use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

/// Return the default location of I2C devices in sysfs.
pub fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys/bus/i2c/devices")
}

// The file written to instantiate a device on a bus.
const NEW_DEVICE: &str = "new_device";

// The file holding the EEPROM contents, within a device directory.
const EEPROM: &str = "eeprom";

/// Return the sysfs directory of the device at `addr` on `bus`.
pub fn device_path(root: &Path, bus: u32, addr: u8) -> PathBuf {
    root.join(format!("{bus}-{addr:04x}"))
}

/// Return the sysfs directory of an I2C bus.
pub fn bus_path(root: &Path, bus: u32) -> PathBuf {
    root.join(format!("i2c-{bus}"))
}

/// Instantiate a device on `bus`, bound to `driver`.
///
/// Returns `false` without writing anything if the device already exists.
pub fn register_device(root: &Path, bus: u32, addr: u8, driver: &'static str) -> Result<bool, Error> {
    if device_path(root, bus, addr).exists() {
        return Ok(false);
    }
    let path = bus_path(root, bus).join(NEW_DEVICE);
    OpenOptions::new()
        .write(true)
        .open(&path)
        .and_then(|mut f| write!(f, "{driver} {addr:#x}"))
        .map_err(|source| Error::Registration {
            driver,
            path,
            source,
        })?;
    Ok(true)
}

/// An EEPROM exposed by a kernel driver as a file in sysfs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SysfsEeprom {
    device: PathBuf,
}

impl SysfsEeprom {
    /// Refer to the EEPROM of the device directory `device`.
    ///
    /// The device need not exist yet.
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
        }
    }

    /// The device's sysfs directory.
    pub fn device_path(&self) -> &Path {
        &self.device
    }

    /// The file holding the EEPROM contents.
    pub fn eeprom_path(&self) -> PathBuf {
        self.device.join(EEPROM)
    }
}

impl EepromDevice for SysfsEeprom {
    fn is_present(&self) -> bool {
        self.eeprom_path().is_file()
    }

    fn read_block(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let mut file = File::open(self.eeprom_path())?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn read_all(&self) -> io::Result<Vec<u8>> {
        fs::read(self.eeprom_path())
    }
}
