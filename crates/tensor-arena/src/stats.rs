// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena usage statistics for diagnostics.
//!
//! [`ArenaStats`] reports how much of the arena a committed plan uses and
//! how much lifetime-based sharing saved. These numbers are what you tune
//! the configured arena size against.

/// Usage of a tensor arena after a plan has been committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ArenaStats {
    /// Arena size in bytes.
    pub capacity_bytes: usize,
    /// Bytes the committed plan occupies (high-water mark).
    pub planned_bytes: usize,
    /// Bytes the same buffers would need without sharing.
    pub naive_bytes: usize,
    /// Number of planned buffers.
    pub buffers: usize,
}

impl ArenaStats {
    /// Fraction of the naive footprint saved by sharing, in `[0.0, 1.0]`.
    ///
    /// Returns `0.0` if nothing has been planned.
    pub fn reuse_ratio(&self) -> f64 {
        if self.naive_bytes == 0 {
            return 0.0;
        }
        1.0 - self.planned_bytes as f64 / self.naive_bytes as f64
    }

    /// Fraction of the arena in use, in `[0.0, 1.0]`.
    pub fn utilisation(&self) -> f64 {
        if self.capacity_bytes == 0 {
            return 0.0;
        }
        self.planned_bytes as f64 / self.capacity_bytes as f64
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Arena: {} / {} bytes used ({:.0}%), {} buffers, {:.0}% saved by reuse ({} bytes without)",
            self.planned_bytes,
            self.capacity_bytes,
            self.utilisation() * 100.0,
            self.buffers,
            self.reuse_ratio() * 100.0,
            self.naive_bytes,
        )
    }
}
