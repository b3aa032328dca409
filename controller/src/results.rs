// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Types for handling data returned by accessing multiple ports.
//!
//! Operating on every port of a device kind should return all the data we can,
//! as well as the failures we hit on the others. An absent module on one port
//! must not hide the data of its neighbours. This is different from Rust's
//! common `Result`, which is either a successful value _or_ an error. We need
//! both, and so use a struct rather than an enum.

use crate::Error;
use eeprom_layout::DeviceKind;
use std::collections::BTreeMap;

/// Information about ports we failed to access.
#[derive(Debug, Default)]
pub struct FailedPorts {
    errors: BTreeMap<u8, Error>,
}

impl FailedPorts {
    /// Return an iterator over the failures, including the port indices and
    /// corresponding error.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Error)> + '_ {
        self.errors.iter().map(|(port, err)| (*port, err))
    }

    /// Return the error for the provided port, if it exists.
    pub fn nth(&self, port: u8) -> Option<&Error> {
        self.errors.get(&port)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A generic type for accessing port-specific data and failures.
///
/// Data and errors are kept sorted by port index, and each port appears in at
/// most one of them.
#[derive(Debug)]
pub struct PortResults<P> {
    pub kind: DeviceKind,
    data: BTreeMap<u8, P>,
    failures: FailedPorts,
}

impl<P> PortResults<P> {
    /// Create an empty result for ports of `kind`.
    pub fn new(kind: DeviceKind) -> Self {
        Self {
            kind,
            data: BTreeMap::new(),
            failures: FailedPorts::default(),
        }
    }

    /// Record the outcome of accessing `port`, replacing any earlier outcome.
    pub fn insert(&mut self, port: u8, result: Result<P, Error>) {
        match result {
            Ok(item) => {
                self.failures.errors.remove(&port);
                self.data.insert(port, item);
            }
            Err(e) => {
                self.data.remove(&port);
                self.failures.errors.insert(port, e);
            }
        }
    }

    /// Return an iterator over the port indices and the corresponding data
    /// from that port.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &P)> + '_ {
        self.data.iter().map(|(port, item)| (*port, item))
    }

    /// Return an iterator over the _errors_ in the result, with the port
    /// indices and the corresponding error.
    pub fn error_iter(&self) -> impl Iterator<Item = (u8, &Error)> + '_ {
        self.failures.iter()
    }

    /// Return the data item for the provided port, if it exists.
    pub fn nth(&self, port: u8) -> Option<&P> {
        self.data.get(&port)
    }

    /// Return the error for the provided port, if it exists.
    pub fn nth_err(&self, port: u8) -> Option<&Error> {
        self.failures.nth(port)
    }

    pub fn failures(&self) -> &FailedPorts {
        &self.failures
    }

    /// Return the number of ports that succeeded.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<P> Extend<(u8, Result<P, Error>)> for PortResults<P> {
    fn extend<I: IntoIterator<Item = (u8, Result<P, Error>)>>(&mut self, iter: I) {
        for (port, result) in iter {
            self.insert(port, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PortResults;
    use crate::Error;
    use eeprom_decode::Error as DecodeError;
    use eeprom_layout::DeviceKind;

    fn absent() -> Error {
        Error::Decode(DecodeError::DeviceNotPresent)
    }

    #[test]
    fn test_port_results() {
        let mut results = PortResults::new(DeviceKind::Qsfp);
        results.extend([(3, Ok("c")), (0, Ok("a")), (1, Err(absent()))]);

        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().collect::<Vec<_>>(), vec![(0, &"a"), (3, &"c")]);
        assert_eq!(results.nth(3), Some(&"c"));
        assert!(results.nth(1).is_none());
        assert!(matches!(
            results.nth_err(1),
            Some(Error::Decode(DecodeError::DeviceNotPresent))
        ));
        assert_eq!(results.error_iter().map(|(port, _)| port).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_port_results_last_outcome_wins() {
        let mut results = PortResults::new(DeviceKind::QsfpDd);
        results.insert(2, Err(absent()));
        results.insert(2, Ok(1));
        assert_eq!(results.nth(2), Some(&1));
        assert!(results.failures().is_empty());

        results.insert(2, Err(absent()));
        assert!(results.is_empty());
        assert_eq!(results.failures().len(), 1);
    }
}
