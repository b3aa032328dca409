// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! A per-decode cache of the pages read from a device.

use crate::EepromDevice;
use crate::Error;
use eeprom_layout::BLOCK_SIZE;
use std::collections::BTreeMap;

#[derive(Debug)]
enum Slot {
    Loaded(Vec<u8>),
    Failed,
}

/// Pages read from a single device during one decode.
///
/// Each page is read from the device at most once. That includes failed
/// reads, which are remembered and not retried. A cache must not outlive the
/// decode that created it, and is never shared between devices.
#[derive(Debug)]
pub struct PageCache<'a, D: ?Sized> {
    device: &'a D,
    page_slots: usize,
    pages: BTreeMap<u8, Slot>,
    reads: usize,
}

impl<'a, D: EepromDevice + ?Sized> PageCache<'a, D> {
    /// Create an empty cache able to hold pages `0..page_slots`.
    pub fn new(device: &'a D, page_slots: usize) -> Self {
        Self {
            device,
            page_slots,
            pages: BTreeMap::new(),
            reads: 0,
        }
    }

    /// Return the contents of `page`, reading it from the device if this is
    /// the first request for it.
    ///
    /// The first failure to read a page is reported as `Error::Transport`;
    /// later requests report `Error::PageUnavailable` without touching the
    /// device.
    pub fn get_or_fetch(&mut self, page: u8) -> Result<&[u8], Error> {
        if usize::from(page) >= self.page_slots {
            return Err(Error::PageOutOfRange {
                page,
                slots: self.page_slots,
            });
        }
        if !self.pages.contains_key(&page) {
            let offset = u64::from(page) * BLOCK_SIZE as u64;
            self.reads += 1;
            match self.device.read_block(offset, BLOCK_SIZE) {
                Ok(bytes) => {
                    self.pages.insert(page, Slot::Loaded(bytes));
                }
                Err(source) => {
                    self.pages.insert(page, Slot::Failed);
                    return Err(Error::Transport { page, source });
                }
            }
        }
        match &self.pages[&page] {
            Slot::Loaded(bytes) => Ok(bytes.as_slice()),
            Slot::Failed => Err(Error::PageUnavailable(page)),
        }
    }

    /// Make sure every page in `pages` has been read, or its read attempted.
    ///
    /// Failures are tolerated, and the pages that could not be read are
    /// returned.
    pub fn prefetch(&mut self, pages: impl IntoIterator<Item = u8>) -> Vec<u8> {
        pages
            .into_iter()
            .filter(|page| self.get_or_fetch(*page).is_err())
            .collect()
    }

    /// Return the contents of `page` if it has already been read.
    pub fn get(&self, page: u8) -> Option<&[u8]> {
        match self.pages.get(&page)? {
            Slot::Loaded(bytes) => Some(bytes.as_slice()),
            Slot::Failed => None,
        }
    }

    /// Return the number of block reads issued to the device.
    pub fn reads(&self) -> usize {
        self.reads
    }
}
