// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! An in-memory EEPROM for tests.

use crate::EepromDevice;
use eeprom_layout::BLOCK_SIZE;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;

/// A fake device backed by a linear image, recording every block read.
#[derive(Debug)]
pub(crate) struct FakeEeprom {
    image: Vec<u8>,
    present: bool,
    failing_pages: Vec<u8>,
    // Pages whose reads return only this many bytes.
    short_pages: BTreeMap<u8, usize>,
    reads: RefCell<Vec<u64>>,
}

impl FakeEeprom {
    /// A present device holding `n_pages` zeroed blocks.
    pub fn new(n_pages: usize) -> Self {
        Self {
            image: vec![0; n_pages * BLOCK_SIZE],
            present: true,
            failing_pages: Vec::new(),
            short_pages: BTreeMap::new(),
            reads: RefCell::new(Vec::new()),
        }
    }

    /// A device whose backing storage does not exist.
    pub fn absent() -> Self {
        Self {
            present: false,
            ..Self::new(0)
        }
    }

    /// Fail every read of `page`.
    pub fn fail_page(mut self, page: u8) -> Self {
        self.failing_pages.push(page);
        self
    }

    /// Return only `len` bytes for reads of `page`.
    pub fn truncate_page(mut self, page: u8, len: usize) -> Self {
        self.short_pages.insert(page, len);
        self
    }

    /// Write `data` at `offset` within `page`.
    pub fn write(&mut self, page: u8, offset: u8, data: &[u8]) {
        let start = usize::from(page) * BLOCK_SIZE + usize::from(offset);
        self.image[start..start + data.len()].copy_from_slice(data);
    }

    /// Write big-endian words starting at `offset` within `page`.
    pub fn write_words(&mut self, page: u8, offset: u8, words: &[u16]) {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
        self.write(page, offset, &bytes);
    }

    /// Return the offsets of every block read issued so far.
    pub fn reads(&self) -> Vec<u64> {
        self.reads.borrow().clone()
    }
}

impl EepromDevice for FakeEeprom {
    fn is_present(&self) -> bool {
        self.present
    }

    fn read_block(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.reads.borrow_mut().push(offset);
        let page = u8::try_from(offset / BLOCK_SIZE as u64).unwrap();
        if self.failing_pages.contains(&page) {
            return Err(io::Error::other("injected read failure"));
        }
        let len = self.short_pages.get(&page).copied().unwrap_or(len);
        let start = (offset as usize).min(self.image.len());
        let end = (start + len).min(self.image.len());
        Ok(self.image[start..end].to_vec())
    }

    fn read_all(&self) -> io::Result<Vec<u8>> {
        Ok(self.image.clone())
    }
}
