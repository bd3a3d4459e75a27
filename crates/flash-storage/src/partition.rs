// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Partition usage accounting.

use crate::StorageError;
use std::path::Path;

/// Capacity and usage of a mounted partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PartitionInfo {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

impl PartitionInfo {
    pub fn free_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.used_bytes)
    }

    /// Returns the utilisation as a fraction in `[0.0, 1.0]`.
    pub fn utilisation(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.used_bytes as f64 / self.total_bytes as f64).min(1.0)
    }

    /// Returns a summary string suitable for logging or CLI display.
    ///
    /// # Example output
    /// ```text
    /// Partition: 1024.0 KB total, 40.0 KB used (4%)
    /// ```
    pub fn summary(&self) -> String {
        format!(
            "Partition: {:.1} KB total, {:.1} KB used ({:.0}%)",
            self.total_bytes as f64 / 1024.0,
            self.used_bytes as f64 / 1024.0,
            self.utilisation() * 100.0,
        )
    }
}

/// Sums the sizes of every regular file under `dir`.
pub(crate) fn used_bytes(dir: &Path) -> Result<u64, StorageError> {
    let display = dir.display().to_string();
    let mut total = 0;
    for entry in std::fs::read_dir(dir).map_err(|e| StorageError::io(&display, e))? {
        let entry = entry.map_err(|e| StorageError::io(&display, e))?;
        let file_type = entry.file_type().map_err(|e| StorageError::io(&display, e))?;
        if file_type.is_dir() {
            total += used_bytes(&entry.path())?;
        } else if file_type.is_file() {
            let meta = entry.metadata().map_err(|e| StorageError::io(&display, e))?;
            total += meta.len();
        }
    }
    Ok(total)
}
