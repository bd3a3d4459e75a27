// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for arena planning and access.

use crate::Region;

/// Errors that can occur when planning or using a tensor arena.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// The plan needs more bytes than the arena holds.
    #[error("arena too small: plan requires {required} bytes, arena holds {capacity}")]
    OutOfMemory { required: usize, capacity: usize },

    /// A region reaches past the end of the arena.
    #[error("region {region} is outside the {capacity}-byte arena")]
    RegionOutOfBounds { region: Region, capacity: usize },

    /// Two regions that must be disjoint share bytes.
    #[error("regions {a} and {b} overlap")]
    OverlappingRegions { a: Region, b: Region },

    /// A buffer request's lifetime is inverted.
    #[error("buffer {index}: first use {first_use} is after last use {last_use}")]
    InvalidLifetime {
        index: usize,
        first_use: usize,
        last_use: usize,
    },

    /// A size string could not be parsed.
    #[error("invalid size {0}")]
    InvalidSize(String),
}
