// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Build a fake sysfs tree holding synthetic EEPROM images.
//!
//! This lets the controller and the command-line tool run without hardware.

use crate::sysfs::bus_path;
use crate::sysfs::device_path;
use crate::topology::Topology;
use crate::Error;
use eeprom_layout::DeviceKind;
use eeprom_layout::Field;
use eeprom_layout::Layout;
use eeprom_layout::RegisterTable;
use eeprom_layout::BLOCK_SIZE;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

/// A linear EEPROM image, written field by field through a register table.
#[derive(Clone, Debug)]
pub struct ImageBuilder {
    layout: &'static Layout,
    image: Vec<u8>,
}

impl ImageBuilder {
    /// Start a zeroed image of `n_pages` blocks for `table`.
    pub fn new(table: RegisterTable, n_pages: usize) -> Self {
        Self {
            layout: table.layout(),
            image: vec![0; n_pages * BLOCK_SIZE],
        }
    }

    // Return the image slice backing `field`, if the layout has it and the
    // image is large enough.
    fn slot(&mut self, field: Field) -> Option<&mut [u8]> {
        let reg = self.layout.field(field)?;
        let start = usize::from(reg.page) * BLOCK_SIZE + usize::from(reg.offset);
        self.image.get_mut(start..start + reg.width.len())
    }

    /// Write the raw byte of a single-octet field.
    pub fn byte(mut self, field: Field, value: u8) -> Self {
        if let Some([b]) = self.slot(field) {
            *b = value;
        }
        self
    }

    /// Write one raw word per channel, repeating the last value as needed.
    pub fn words(mut self, field: Field, values: &[u16]) -> Self {
        if let Some(slot) = self.slot(field) {
            for (i, chunk) in slot.chunks_exact_mut(2).enumerate() {
                if let Some(v) = values.get(i).or(values.last()) {
                    chunk.copy_from_slice(&v.to_be_bytes());
                }
            }
        }
        self
    }

    /// Write a string, space padded to the field width.
    pub fn ascii(mut self, field: Field, value: &str) -> Self {
        if let Some(slot) = self.slot(field) {
            slot.fill(b' ');
            let n = value.len().min(slot.len());
            slot[..n].copy_from_slice(&value.as_bytes()[..n]);
        }
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.image
    }
}

/// Return a plausible QSFP image, with values that vary by port.
pub fn qsfp_image(port: u8) -> Vec<u8> {
    let p = u16::from(port);
    ImageBuilder::new(RegisterTable::Sff8436, 2)
        .words(Field::Temperature, &[25 * 256 + p * 64])
        .words(Field::SupplyVoltage, &[33_000])
        .words(Field::RxPower, &[4_000 + p, 4_100 + p, 4_200 + p, 4_300 + p])
        .words(Field::TxBias, &[3_000 + p])
        .ascii(Field::VendorName, "UFISPACE MOCK")
        .ascii(Field::SerialNumber, &format!("QSFP{port:04}"))
        .build()
}

/// Return a plausible QSFP-DD image.
///
/// Even ports report CMIS 3.0, odd ports CMIS 2.0, so that both register
/// tables are exercised.
pub fn qsfpdd_image(port: u8) -> Vec<u8> {
    let p = u16::from(port);
    let (table, revision) = if port % 2 == 0 {
        (RegisterTable::Cmis30, 0x30)
    } else {
        (RegisterTable::Cmis20, 0x20)
    };
    let n_pages = table
        .layout()
        .pages()
        .last()
        .map_or(1, |page| usize::from(*page) + 1);
    ImageBuilder::new(table, n_pages)
        .byte(Field::Revision, revision)
        .words(Field::Temperature, &[40 * 256 + p * 64])
        .words(Field::SupplyVoltage, &[32_900])
        .words(Field::TxPower, &[10_000 + p])
        .words(Field::TxBias, &[4_000])
        .words(Field::RxPower, &[8_000 - p])
        .ascii(Field::VendorName, "UFISPACE MOCK")
        .ascii(Field::SerialNumber, &format!("QSFPDD{port:04}"))
        .build()
}

/// Return a CPU board EEPROM image.
///
/// The contents are opaque to the decoder, so this is a recognizable pattern.
pub fn cpu_image() -> Vec<u8> {
    let mut image = b"TlvInfo\0".to_vec();
    image.resize(2 * BLOCK_SIZE, 0xff);
    image
}

/// Return the image for a device on a mock board.
pub fn image_for(kind: DeviceKind, port: u8) -> Vec<u8> {
    match kind {
        DeviceKind::Cpu => cpu_image(),
        DeviceKind::Qsfp => qsfp_image(port),
        DeviceKind::QsfpDd => qsfpdd_image(port),
    }
}

/// A fake sysfs tree laid out as for a given board.
#[derive(Clone, Debug)]
pub struct MockSysfs {
    root: PathBuf,
    topology: Topology,
}

impl MockSysfs {
    pub fn new(root: impl Into<PathBuf>, topology: Topology) -> Self {
        Self {
            root: root.into(),
            topology,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the bus directory serving a port, with an empty `new_device`
    /// file, and return the bus directory.
    pub fn add_bus(&self, kind: DeviceKind, port: u8) -> Result<PathBuf, Error> {
        let bus = self.topology.bus_for(kind, port)?;
        let path = bus_path(&self.root, bus);
        fs::create_dir_all(&path)?;
        let new_device = path.join("new_device");
        if !new_device.exists() {
            fs::write(new_device, "")?;
        }
        Ok(path)
    }

    /// Create a registered device holding `image`, and return its directory.
    pub fn add_device(&self, kind: DeviceKind, port: u8, image: &[u8]) -> Result<PathBuf, Error> {
        self.add_bus(kind, port)?;
        let bus = self.topology.bus_for(kind, port)?;
        let path = device_path(&self.root, bus, kind.address());
        fs::create_dir_all(&path)?;
        fs::write(path.join("eeprom"), image)?;
        Ok(path)
    }

    /// Populate every port of every kind, leaving the ports in `absent` with
    /// only their bus.
    pub fn populate(&self, absent: &[(DeviceKind, u8)]) -> Result<(), Error> {
        for kind in [DeviceKind::Cpu, DeviceKind::Qsfp, DeviceKind::QsfpDd] {
            for port in kind.ports() {
                if absent.contains(&(kind, port)) {
                    self.add_bus(kind, port)?;
                } else {
                    self.add_device(kind, port, &image_for(kind, port))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::qsfp_image;
    use super::qsfpdd_image;
    use super::ImageBuilder;
    use super::MockSysfs;
    use crate::topology::MuxBuses;
    use crate::topology::Topology;
    use eeprom_layout::BoardId;
    use eeprom_layout::DeviceKind;
    use eeprom_layout::Field;
    use eeprom_layout::RegisterTable;

    #[test]
    fn test_image_builder() {
        let image = ImageBuilder::new(RegisterTable::Sff8436, 2)
            .words(Field::TxBias, &[1, 2])
            .ascii(Field::VendorName, "ACME")
            .build();
        assert_eq!(image.len(), 256);
        assert_eq!(&image[42..50], &[0, 1, 0, 2, 0, 2, 0, 2]);
        assert_eq!(&image[128 + 20..128 + 36], b"ACME            ");
    }

    #[test]
    fn test_image_builder_skips_missing_fields() {
        // SFF-8436 has no revision field, and one page cannot hold page 1.
        let image = ImageBuilder::new(RegisterTable::Sff8436, 1)
            .byte(Field::Revision, 0xff)
            .ascii(Field::VendorName, "ACME")
            .build();
        assert_eq!(image, vec![0; 128]);
    }

    #[test]
    fn test_mock_images() {
        assert_eq!(qsfp_image(0).len(), 256);
        let dd = qsfpdd_image(0);
        assert_eq!(dd.len(), 19 * 128);
        assert_eq!(dd[1], 0x30);
        let dd = qsfpdd_image(1);
        assert_eq!(dd.len(), 256);
        assert_eq!(dd[1], 0x20);
    }

    #[test]
    fn test_populate() {
        let root = tempfile::tempdir().unwrap();
        let topology = Topology::new(BoardId(BoardId::NCP1_1_ALPHA), MuxBuses::contiguous(10));
        let mock = MockSysfs::new(root.path(), topology);
        mock.populate(&[(DeviceKind::Qsfp, 3)]).unwrap();

        assert!(root.path().join("0-0057/eeprom").is_file());
        assert!(root.path().join("i2c-0/new_device").is_file());
        // QSFP port 3 is on mux Qsfp0, channel 3, so bus 10 + 3 * 8 + 3.
        assert!(root.path().join("i2c-37").is_dir());
        assert!(!root.path().join("37-0050").exists());
        assert!(root.path().join("36-0050/eeprom").is_file());
    }
}
