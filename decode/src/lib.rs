// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Decode identity and monitoring data from board and transceiver EEPROMs.

pub mod cache;
pub mod field;
pub mod module;
pub mod revision;

#[cfg(test)]
mod test_utils;

pub use cache::PageCache;
pub use module::decode;
pub use module::decode_qsfp;
pub use module::decode_qsfpdd;
pub use module::ModuleInfo;
pub use module::QsfpDdInfo;
pub use module::QsfpInfo;
pub use revision::Revision;

use eeprom_layout::DeviceKind;
use thiserror::Error;

/// An error related to reading or decoding an EEPROM.
#[derive(Debug, Error)]
pub enum Error {
    /// The device's backing storage does not exist, e.g., because no driver
    /// was ever registered for it.
    #[error("EEPROM device is not present")]
    DeviceNotPresent,

    /// A block read failed on a device that is present.
    #[error("Failed to read page {page}")]
    Transport {
        page: u8,
        #[source]
        source: std::io::Error,
    },

    /// A page whose earlier read failed was requested again.
    #[error("Page {0} is unavailable after a failed read")]
    PageUnavailable(u8),

    /// A page index beyond what a reader is sized for.
    #[error("Page {page} is out of range, only {slots} page slots exist")]
    PageOutOfRange { page: u8, slots: usize },

    /// The lower page was too short to hold the revision byte.
    #[error("Module revision could not be read")]
    RevisionUnavailable,

    /// The device kind has no structured decoder.
    #[error("No decoder exists for {0} devices")]
    NoDecoder(DeviceKind),

    #[error("Failed to read EEPROM")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Layout(#[from] eeprom_layout::Error),
}

/// A trait for reading the raw contents of an EEPROM.
///
/// This is implemented by whatever transport reaches the device, such as the
/// kernel's sysfs interface. Reads are blocking.
pub trait EepromDevice {
    /// Return true if the device's backing storage exists.
    fn is_present(&self) -> bool;

    /// Read up to `len` bytes starting at byte `offset`.
    ///
    /// Fewer bytes may be returned if the device ends before `offset + len`.
    fn read_block(&self, offset: u64, len: usize) -> std::io::Result<Vec<u8>>;

    /// Read the entire contents of the device.
    fn read_all(&self) -> std::io::Result<Vec<u8>>;
}

/// Return the whole, undecoded contents of an EEPROM.
///
/// This works for every kind of device, including those without a decoder.
pub fn dump_raw<D: EepromDevice + ?Sized>(device: &D) -> Result<Vec<u8>, Error> {
    if !device.is_present() {
        return Err(Error::DeviceNotPresent);
    }
    Ok(device.read_all()?)
}

#[cfg(test)]
mod tests {
    use super::dump_raw;
    use super::Error;
    use crate::test_utils::FakeEeprom;

    #[test]
    fn test_dump_raw() {
        let mut device = FakeEeprom::new(2);
        device.write(1, 127, &[0x42]);
        let raw = dump_raw(&device).unwrap();
        assert_eq!(raw.len(), 256);
        assert_eq!(raw[255], 0x42);
    }

    #[test]
    fn test_dump_raw_absent() {
        let device = FakeEeprom::absent();
        assert!(matches!(dump_raw(&device), Err(Error::DeviceNotPresent)));
        assert!(device.reads().is_empty());
    }
}
