// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Patterns for the two-digit seven-segment beacon LED.
//!
//! The left and right digits are wired differently, so each has its own table
//! mapping a hex digit to the segment lines. Bits are line levels in the order
//! the IO expander takes them. The displays are active-low: a lit segment is a
//! clear bit, which is why `8` is the empty set.

use bitflags::bitflags;
use serde::Deserialize;
use serde::Serialize;

bitflags! {
    /// The line levels of one seven-segment digit.
    #[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
    pub struct Segments: u8 {
        const S0 = 1 << 0;
        const S1 = 1 << 1;
        const S2 = 1 << 2;
        const S3 = 1 << 3;
        const S4 = 1 << 4;
        const S5 = 1 << 5;
        const S6 = 1 << 6;
    }
}

impl Segments {
    /// The number of segment lines in a digit.
    pub const COUNT: usize = 7;

    /// Build a pattern from per-line levels, first line first.
    pub const fn from_levels(levels: [u8; Self::COUNT]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < Self::COUNT {
            if levels[i] != 0 {
                bits |= 1 << i;
            }
            i += 1;
        }
        Self::from_bits_retain(bits)
    }

    /// Return the per-line levels, first line first.
    pub fn levels(self) -> [u8; Self::COUNT] {
        std::array::from_fn(|i| (self.bits() >> i) & 1)
    }
}

const fn p(levels: [u8; Segments::COUNT]) -> Segments {
    Segments::from_levels(levels)
}

/// Left digit patterns, indexed by hex digit.
pub const LEFT: [Segments; 16] = [
    p([0, 0, 0, 0, 1, 0, 0]), // 0
    p([0, 0, 1, 1, 1, 1, 1]), // 1
    p([1, 0, 0, 0, 0, 1, 0]), // 2
    p([0, 0, 1, 0, 0, 1, 0]), // 3
    p([0, 0, 1, 1, 0, 0, 1]), // 4
    p([0, 1, 1, 0, 0, 0, 0]), // 5
    p([0, 1, 0, 0, 0, 0, 0]), // 6
    p([0, 0, 1, 1, 1, 0, 0]), // 7
    p([0, 0, 0, 0, 0, 0, 0]), // 8
    p([0, 0, 1, 1, 0, 0, 0]), // 9
    p([0, 0, 0, 1, 0, 0, 0]), // a
    p([0, 1, 0, 0, 0, 0, 1]), // b
    p([1, 1, 0, 0, 1, 0, 0]), // c
    p([0, 0, 0, 0, 0, 1, 1]), // d
    p([1, 1, 0, 0, 0, 0, 0]), // e
    p([1, 1, 0, 1, 0, 0, 0]), // f
];

/// Right digit patterns, indexed by hex digit.
pub const RIGHT: [Segments; 16] = [
    p([0, 0, 0, 0, 0, 0, 1]), // 0
    p([1, 1, 0, 1, 1, 0, 1]), // 1
    p([0, 0, 1, 1, 0, 0, 0]), // 2
    p([0, 1, 0, 1, 0, 0, 0]), // 3
    p([1, 1, 0, 0, 1, 0, 0]), // 4
    p([0, 1, 0, 0, 0, 1, 0]), // 5
    p([0, 0, 0, 0, 0, 1, 0]), // 6
    p([0, 1, 0, 0, 1, 0, 1]), // 7
    p([0, 0, 0, 0, 0, 0, 0]), // 8
    p([0, 1, 0, 0, 1, 0, 0]), // 9
    p([0, 0, 0, 0, 1, 0, 0]), // a
    p([1, 0, 0, 0, 0, 1, 0]), // b
    p([0, 0, 1, 0, 0, 1, 1]), // c
    p([1, 0, 0, 1, 0, 0, 0]), // d
    p([0, 0, 1, 0, 0, 1, 0]), // e
    p([0, 0, 1, 0, 1, 1, 0]), // f
];

/// Return the left and right digit patterns that display `value` as two hex
/// digits.
pub const fn encode_beacon(value: u8) -> (Segments, Segments) {
    let left = (value >> 4) as usize;
    let right = (value & 0x0f) as usize;
    (LEFT[left], RIGHT[right])
}
