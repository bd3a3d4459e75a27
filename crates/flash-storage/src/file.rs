// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Open file handles.
//!
//! A [`StorageFile`] holds one of the partition's `max_files` slots. The
//! slot is released when the handle is dropped, so the borrow checker and
//! RAII enforce the open-file limit with no explicit close.

use crate::StorageError;
use std::fs::File;
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Reservation of one open-file slot.
#[derive(Debug)]
pub(crate) struct FileSlot {
    open: Arc<AtomicUsize>,
}

impl FileSlot {
    /// Takes a slot, failing if `max` are already in use.
    pub(crate) fn acquire(open: &Arc<AtomicUsize>, max: usize) -> Result<Self, StorageError> {
        open.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
            (n < max).then_some(n + 1)
        })
        .map_err(|_| StorageError::TooManyOpenFiles { max })?;
        Ok(Self {
            open: Arc::clone(open),
        })
    }
}

impl Drop for FileSlot {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A readable file on the partition.
#[derive(Debug)]
pub struct StorageFile {
    file: File,
    path: String,
    len: u64,
    _slot: FileSlot,
}

impl StorageFile {
    pub(crate) fn new(file: File, path: String, len: u64, slot: FileSlot) -> Self {
        Self {
            file,
            path,
            len,
            _slot: slot,
        }
    }

    /// Virtual path the file was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads until `buf` is full or the file ends; returns the byte count.
    pub fn read_fully(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(StorageError::io(&self.path, e)),
            }
        }
        Ok(filled)
    }
}

impl Read for StorageFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_limit_and_release() {
        let open = Arc::new(AtomicUsize::new(0));
        let a = FileSlot::acquire(&open, 2).unwrap();
        let _b = FileSlot::acquire(&open, 2).unwrap();
        assert!(matches!(
            FileSlot::acquire(&open, 2),
            Err(StorageError::TooManyOpenFiles { max: 2 })
        ));
        drop(a);
        assert_eq!(open.load(Ordering::Acquire), 1);
        assert!(FileSlot::acquire(&open, 2).is_ok());
    }
}
