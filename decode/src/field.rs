// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Extract and convert individual fields from a page buffer.
//!
//! Everything here operates on bytes already read into memory. A field that
//! runs past the end of its buffer (e.g., after a short read) decodes to
//! `None`, and never affects any other field.

// Temperature resolution is 1/256 degrees C.
const TEMP_DIVISOR: f32 = 256.0;

// Supply voltage resolution is 100 uV.
const SUPPLY_VOLTAGE_DIVISOR: f32 = 10_000.0;

// Optical power resolution is 0.1 uW, reported in mW.
const OPTICAL_POWER_DIVISOR: f32 = 10_000.0;

// Bias current resolution is 2 uA, reported in mA. This is applied as
// `raw * 2 / 1000` so that the only rounding happens in the division.
const BIAS_CURRENT_LSB_UA: u32 = 2;
const UA_PER_MA: f32 = 1_000.0;

/// Return `len` bytes of `buf` starting at `offset`, if they are all present.
pub fn read_bytes_at(buf: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    buf.get(offset..offset.checked_add(len)?)
}

/// Read a single octet.
pub fn read_byte(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

/// Read a big-endian 16-bit word.
pub fn read_word(buf: &[u8], offset: usize) -> Option<u16> {
    read_bytes_at(buf, offset, 2).map(|b| u16::from_be_bytes([b[0], b[1]]))
}

/// Read `repeat` consecutive words, one per channel.
///
/// Each channel is read independently, so a truncated buffer yields the
/// channels that fit followed by `None`s.
pub fn read_words(buf: &[u8], offset: usize, repeat: usize) -> Vec<Option<u16>> {
    (0..repeat)
        .map(|i| read_word(buf, offset + i * 2))
        .collect()
}

/// Read a fixed-length ASCII string, trimming surrounding whitespace and NUL
/// padding.
///
/// Any non-ASCII octet makes the whole field malformed.
pub fn read_ascii(buf: &[u8], offset: usize, len: usize) -> Option<String> {
    let bytes = read_bytes_at(buf, offset, len)?;
    ascii_to_string(bytes)
}

fn ascii_to_string(bytes: &[u8]) -> Option<String> {
    if !bytes.is_ascii() {
        return None;
    }
    let s = std::str::from_utf8(bytes).ok()?;
    Some(
        s.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0')
            .to_string(),
    )
}

/// Interpret the low `bits` bits of `value` as a two's-complement integer.
///
/// `bits` must be in `1..=62`.
pub const fn twos_complement(value: u64, bits: u32) -> i64 {
    let mask = (1u64 << bits) - 1;
    let value = (value & mask) as i64;
    if value & (1 << (bits - 1)) != 0 {
        value - (1 << bits)
    } else {
        value
    }
}

/// Module temperature in degrees C.
pub fn decode_temperature(raw: u16) -> f32 {
    twos_complement(u64::from(raw), 16) as f32 / TEMP_DIVISOR
}

/// Supply voltage in Volts.
pub fn decode_supply_voltage(raw: u16) -> f32 {
    f32::from(raw) / SUPPLY_VOLTAGE_DIVISOR
}

/// Receiver or transmitter optical power in milliwatts, 0 to 6.5535.
pub fn decode_optical_power(raw: u16) -> f32 {
    f32::from(raw) / OPTICAL_POWER_DIVISOR
}

/// Transmitter bias current in milliamps, 0 to 131.
pub fn decode_bias_current(raw: u16) -> f32 {
    (u32::from(raw) * BIAS_CURRENT_LSB_UA) as f32 / UA_PER_MA
}

#[cfg(test)]
mod tests {
    use super::decode_bias_current;
    use super::decode_optical_power;
    use super::decode_supply_voltage;
    use super::decode_temperature;
    use super::read_ascii;
    use super::read_byte;
    use super::read_bytes_at;
    use super::read_word;
    use super::read_words;
    use super::twos_complement;

    #[test]
    fn test_twos_complement() {
        assert_eq!(twos_complement(0, 16), 0);
        assert_eq!(twos_complement(1, 16), 1);
        assert_eq!(twos_complement(32767, 16), 32767);
        assert_eq!(twos_complement(32768, 16), -32768);
        assert_eq!(twos_complement(65535, 16), -1);
        assert_eq!(twos_complement(0x80, 8), -128);
        assert_eq!(twos_complement(0x7f, 8), 127);
    }

    #[test]
    fn test_twos_complement_matches_i16() {
        for v in (0..=u16::MAX).step_by(97) {
            assert_eq!(twos_complement(u64::from(v), 16), i64::from(v as i16));
        }
    }

    // These are floating-point equalities, but each conversion is a single
    // correctly rounded division, so they match the literal exactly.
    #[test]
    fn test_conversions() {
        assert_eq!(decode_temperature(0x1900), 25.0);
        assert_eq!(decode_temperature(0xff00), -1.0);
        assert_eq!(decode_temperature(0x8000), -128.0);
        assert_eq!(decode_supply_voltage(0x81c6), 3.3222);
        assert_eq!(decode_optical_power(0xffff), 6.5535);
        assert_eq!(decode_optical_power(1000), 0.1);
        assert_eq!(decode_bias_current(0x0384), 1.8);
        assert_eq!(decode_bias_current(0xffff), 131.07);
    }

    #[test]
    fn test_read_bytes_at() {
        let buf = [1, 2, 3, 4];
        assert_eq!(read_bytes_at(&buf, 1, 2), Some(&buf[1..3]));
        assert_eq!(read_bytes_at(&buf, 3, 2), None);
        assert_eq!(read_bytes_at(&buf, usize::MAX, 2), None);
        assert_eq!(read_byte(&buf, 3), Some(4));
        assert_eq!(read_byte(&buf, 4), None);
    }

    #[test]
    fn test_read_words_truncated() {
        let buf = [0x00, 0x01, 0x00, 0x02, 0x00];
        assert_eq!(read_words(&buf, 0, 3), vec![Some(1), Some(2), None]);
        assert_eq!(read_word(&buf, 1), Some(0x0100));
    }

    #[test]
    fn test_read_ascii() {
        let mut buf = vec![0; 4];
        buf.extend_from_slice(b"ACME CORP       ");
        assert_eq!(read_ascii(&buf, 4, 16).as_deref(), Some("ACME CORP"));
        assert_eq!(read_ascii(b"  SN 1\0\0", 0, 8).as_deref(), Some("SN 1"));
        assert_eq!(read_ascii(b"        ", 0, 8).as_deref(), Some(""));
        assert_eq!(read_ascii(&buf, 10, 16), None);
        assert_eq!(read_ascii(&[b'A', 0xff], 0, 2), None);
    }
}
