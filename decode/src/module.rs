// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Decode identity and monitoring data from a transceiver module.

use crate::cache::PageCache;
use crate::field::decode_bias_current;
use crate::field::decode_optical_power;
use crate::field::decode_supply_voltage;
use crate::field::decode_temperature;
use crate::field::read_ascii;
use crate::field::read_word;
use crate::field::read_words;
use crate::revision::Revision;
use crate::EepromDevice;
use crate::Error;
use eeprom_layout::cmis;
use eeprom_layout::DeviceKind;
use eeprom_layout::Field;
use eeprom_layout::FieldWidth;
use eeprom_layout::Layout;
use eeprom_layout::RegisterField;
use eeprom_layout::RegisterTable;

/// Data decoded from a QSFP (SFF-8436) module.
///
/// Every value is optional. `None` means the value could not be read or was
/// malformed, which is distinct from a measured zero.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct QsfpInfo {
    /// The measured module temperature (degrees C).
    pub temperature: Option<f32>,

    /// The measured input supply voltage (Volts).
    pub supply_voltage: Option<f32>,

    /// The vendor name, with padding removed.
    pub vendor: Option<String>,

    /// The vendor serial number, with padding removed.
    pub serial: Option<String>,

    /// The measured input optical power per lane (milliwatts).
    pub receiver_power: Vec<Option<f32>>,

    /// The output laser bias current per lane (milliamps).
    pub transmitter_bias_current: Vec<Option<f32>>,
}

/// Data decoded from a QSFP-DD (CMIS) module.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
pub struct QsfpDdInfo {
    /// The CMIS revision reported by the module, e.g. `"3.0"`.
    pub revision: String,

    /// The measured module temperature (degrees C).
    pub temperature: Option<f32>,

    /// The measured input supply voltage (Volts).
    pub supply_voltage: Option<f32>,

    /// The vendor name, with padding removed.
    pub vendor: Option<String>,

    /// The vendor serial number, with padding removed.
    pub serial: Option<String>,

    /// The measured output optical power per lane (milliwatts).
    pub transmitter_power: Vec<Option<f32>>,

    /// The output laser bias current per lane (milliamps).
    pub transmitter_bias_current: Vec<Option<f32>>,

    /// The measured input optical power per lane (milliwatts).
    pub receiver_power: Vec<Option<f32>>,
}

/// Decoded data from any supported transceiver module.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    any(feature = "api-traits", test),
    derive(serde::Deserialize, serde::Serialize, schemars::JsonSchema)
)]
#[cfg_attr(any(feature = "api-traits", test), serde(rename_all = "snake_case"))]
pub enum ModuleInfo {
    Qsfp(QsfpInfo),
    QsfpDd(QsfpDdInfo),
}

impl ModuleInfo {
    /// Return the kind of device this was decoded from.
    pub fn kind(&self) -> DeviceKind {
        match self {
            ModuleInfo::Qsfp(_) => DeviceKind::Qsfp,
            ModuleInfo::QsfpDd(_) => DeviceKind::QsfpDd,
        }
    }

    /// Return the CMIS revision label, which only QSFP-DD modules report.
    pub fn revision(&self) -> Option<&str> {
        match self {
            ModuleInfo::Qsfp(_) => None,
            ModuleInfo::QsfpDd(info) => Some(&info.revision),
        }
    }

    pub fn temperature(&self) -> Option<f32> {
        match self {
            ModuleInfo::Qsfp(info) => info.temperature,
            ModuleInfo::QsfpDd(info) => info.temperature,
        }
    }

    pub fn supply_voltage(&self) -> Option<f32> {
        match self {
            ModuleInfo::Qsfp(info) => info.supply_voltage,
            ModuleInfo::QsfpDd(info) => info.supply_voltage,
        }
    }

    pub fn vendor(&self) -> Option<&str> {
        match self {
            ModuleInfo::Qsfp(info) => info.vendor.as_deref(),
            ModuleInfo::QsfpDd(info) => info.vendor.as_deref(),
        }
    }

    pub fn serial(&self) -> Option<&str> {
        match self {
            ModuleInfo::Qsfp(info) => info.serial.as_deref(),
            ModuleInfo::QsfpDd(info) => info.serial.as_deref(),
        }
    }

    pub fn receiver_power(&self) -> &[Option<f32>] {
        match self {
            ModuleInfo::Qsfp(info) => &info.receiver_power,
            ModuleInfo::QsfpDd(info) => &info.receiver_power,
        }
    }

    pub fn transmitter_bias_current(&self) -> &[Option<f32>] {
        match self {
            ModuleInfo::Qsfp(info) => &info.transmitter_bias_current,
            ModuleInfo::QsfpDd(info) => &info.transmitter_bias_current,
        }
    }

    /// Return the per-lane output power, which SFF-8436 modules do not
    /// report.
    pub fn transmitter_power(&self) -> Option<&[Option<f32>]> {
        match self {
            ModuleInfo::Qsfp(_) => None,
            ModuleInfo::QsfpDd(info) => Some(&info.transmitter_power),
        }
    }
}

// Resolves fields of one layout against the pages already in a cache.
//
// Any field whose page failed, or which runs past the end of a short page,
// decodes to `None` without affecting other fields.
struct FieldReader<'c, 'a, D: ?Sized> {
    cache: &'c PageCache<'a, D>,
    layout: &'static Layout,
}

impl<'c, 'a, D: EepromDevice + ?Sized> FieldReader<'c, 'a, D> {
    fn new(cache: &'c PageCache<'a, D>, layout: &'static Layout) -> Self {
        Self { cache, layout }
    }

    fn locate(&self, field: Field) -> Option<(&'c [u8], RegisterField)> {
        let reg = self.layout.field(field)?;
        let page = self.cache.get(reg.page)?;
        Some((page, reg))
    }

    fn word(&self, field: Field, convert: fn(u16) -> f32) -> Option<f32> {
        let (page, reg) = self.locate(field)?;
        read_word(page, usize::from(reg.offset)).map(convert)
    }

    fn ascii(&self, field: Field) -> Option<String> {
        let (page, reg) = self.locate(field)?;
        read_ascii(page, usize::from(reg.offset), reg.width.len())
    }

    // Always one entry per channel of the layout.
    fn channels(&self, field: Field, convert: fn(u16) -> f32) -> Vec<Option<f32>> {
        let n_channels = usize::from(self.layout.channel_count);
        let Some((page, reg)) = self.locate(field) else {
            return vec![None; n_channels];
        };
        let repeat = match reg.width {
            FieldWidth::Word { repeat } => usize::from(repeat),
            _ => n_channels,
        };
        let mut values: Vec<_> = read_words(page, usize::from(reg.offset), repeat)
            .into_iter()
            .map(|word| word.map(convert))
            .collect();
        values.resize(n_channels, None);
        values
    }
}

/// Decode a QSFP module using the SFF-8436 register table.
///
/// The device must be present, and its lower page readable. Every other
/// failure is reported per-field.
pub fn decode_qsfp<D: EepromDevice + ?Sized>(device: &D) -> Result<ModuleInfo, Error> {
    if !device.is_present() {
        return Err(Error::DeviceNotPresent);
    }
    let layout = RegisterTable::Sff8436.layout();
    let mut cache = PageCache::new(device, layout.page_slots);
    cache.get_or_fetch(0)?;
    cache.prefetch(layout.pages());

    let fields = FieldReader::new(&cache, layout);
    Ok(ModuleInfo::Qsfp(QsfpInfo {
        temperature: fields.word(Field::Temperature, decode_temperature),
        supply_voltage: fields.word(Field::SupplyVoltage, decode_supply_voltage),
        vendor: fields.ascii(Field::VendorName),
        serial: fields.ascii(Field::SerialNumber),
        receiver_power: fields.channels(Field::RxPower, decode_optical_power),
        transmitter_bias_current: fields.channels(Field::TxBias, decode_bias_current),
    }))
}

/// Decode a QSFP-DD module.
///
/// The CMIS revision in the lower page selects the register table used for
/// everything else.
pub fn decode_qsfpdd<D: EepromDevice + ?Sized>(device: &D) -> Result<ModuleInfo, Error> {
    if !device.is_present() {
        return Err(Error::DeviceNotPresent);
    }
    let mut cache = PageCache::new(device, cmis::PAGE_SLOTS);
    let revision = Revision::from_page(cache.get_or_fetch(0)?).ok_or(Error::RevisionUnavailable)?;
    let layout = revision.register_table().layout();
    cache.prefetch(layout.pages());

    let fields = FieldReader::new(&cache, layout);
    Ok(ModuleInfo::QsfpDd(QsfpDdInfo {
        revision: revision.label(),
        temperature: fields.word(Field::Temperature, decode_temperature),
        supply_voltage: fields.word(Field::SupplyVoltage, decode_supply_voltage),
        vendor: fields.ascii(Field::VendorName),
        serial: fields.ascii(Field::SerialNumber),
        transmitter_power: fields.channels(Field::TxPower, decode_optical_power),
        transmitter_bias_current: fields.channels(Field::TxBias, decode_bias_current),
        receiver_power: fields.channels(Field::RxPower, decode_optical_power),
    }))
}

/// Decode the module behind `device` according to its kind.
pub fn decode<D: EepromDevice + ?Sized>(kind: DeviceKind, device: &D) -> Result<ModuleInfo, Error> {
    match kind {
        DeviceKind::Qsfp => decode_qsfp(device),
        DeviceKind::QsfpDd => decode_qsfpdd(device),
        DeviceKind::Cpu => Err(Error::NoDecoder(kind)),
    }
}
