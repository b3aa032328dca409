// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Drive the two-digit beacon LED on the front panel.

use crate::Error;
use eeprom_layout::beacon::encode_beacon;
use eeprom_layout::beacon::Segments;
use slog::debug;
use slog::error;
use slog::Logger;

/// Something that can light the segment lines of both beacon digits.
///
/// On hardware this is an IO expander, owned by another part of the platform.
pub trait SegmentDisplay {
    fn set_segments(&mut self, left: Segments, right: Segments) -> Result<(), Error>;
}

/// The beacon LED, showing a value as two hex digits.
#[derive(Debug)]
pub struct BeaconLed<D> {
    display: D,
    log: Logger,
}

impl<D: SegmentDisplay> BeaconLed<D> {
    pub fn new(display: D, log: Logger) -> Self {
        Self { display, log }
    }

    /// Show `value` on the beacon.
    pub fn set(&mut self, value: u8) -> Result<(), Error> {
        let (left, right) = encode_beacon(value);
        debug!(
            self.log,
            "setting beacon";
            "value" => format!("{value:02x}"),
            "left" => ?left.levels(),
            "right" => ?right.levels(),
        );
        self.display.set_segments(left, right).inspect_err(|e| {
            error!(self.log, "failed to set beacon"; "value" => value, "reason" => %e);
        })
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::BeaconLed;
    use super::SegmentDisplay;
    use crate::test_utils::test_logger;
    use crate::Error;
    use eeprom_layout::beacon::Segments;
    use eeprom_layout::beacon::LEFT;
    use eeprom_layout::beacon::RIGHT;
    use std::io;

    #[derive(Debug, Default)]
    struct Recorder {
        shown: Vec<(Segments, Segments)>,
        broken: bool,
    }

    impl SegmentDisplay for Recorder {
        fn set_segments(&mut self, left: Segments, right: Segments) -> Result<(), Error> {
            if self.broken {
                return Err(Error::Io(io::Error::other("expander unreachable")));
            }
            self.shown.push((left, right));
            Ok(())
        }
    }

    #[test]
    fn test_set_beacon() {
        let mut led = BeaconLed::new(Recorder::default(), test_logger());
        led.set(5).unwrap();
        led.set(0xab).unwrap();
        assert_eq!(
            led.display().shown,
            vec![(LEFT[0], RIGHT[5]), (LEFT[0xa], RIGHT[0xb])]
        );
    }

    #[test]
    fn test_set_beacon_failure() {
        let display = Recorder {
            broken: true,
            ..Default::default()
        };
        let mut led = BeaconLed::new(display, test_logger());
        assert!(matches!(led.set(1), Err(Error::Io(_))));
        assert!(led.display().shown.is_empty());
    }
}
