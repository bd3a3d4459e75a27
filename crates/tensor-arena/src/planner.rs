// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Greedy, lifetime-aware arena planner.
//!
//! Every non-constant tensor becomes a [`BufferRequest`] with the index of
//! the first and last operator that touches it. Two buffers may share bytes
//! only if their lifetimes are disjoint.
//!
//! # Algorithm
//!
//! Requests are placed largest first. For each request, the regions already
//! placed whose lifetimes overlap it are sorted by offset, and the request
//! goes into the first gap large enough to hold it (or after the last one).
//!
//! ```text
//! offset ─────────────────────────────►
//! op 0   [ input  ][ conv0 out       ]
//! op 1   [ dw out ][ conv0 out       ]     input is dead: dw reuses it
//! op 2   [ dw out ][ pool out ]
//! ```
//!
//! The result is not optimal, but it is deterministic and matches what
//! micro-controller runtimes ship.

use crate::ArenaError;
use std::fmt;

/// A byte range inside the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct Region {
    pub offset: usize,
    pub len: usize,
}

impl Region {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// One past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Returns `true` if the two regions share at least one byte.
    pub fn overlaps(&self, other: &Region) -> bool {
        self.len > 0 && other.len > 0 && self.offset < other.end() && other.offset < self.end()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.offset, self.end())
    }
}

/// A buffer that must be live from operator `first_use` to `last_use`
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BufferRequest {
    pub size: usize,
    pub first_use: usize,
    pub last_use: usize,
}

impl BufferRequest {
    pub fn new(size: usize, first_use: usize, last_use: usize) -> Self {
        Self {
            size,
            first_use,
            last_use,
        }
    }

    /// Returns `true` if both buffers are live during some operator.
    pub fn lifetime_overlaps(&self, other: &BufferRequest) -> bool {
        self.first_use <= other.last_use && other.first_use <= self.last_use
    }
}

/// The output of [`plan`]: one region per request, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct ArenaPlan {
    pub regions: Vec<Region>,
    /// High-water mark; the arena must be at least this large.
    pub total_bytes: usize,
    /// Sum of aligned request sizes, i.e. the footprint without reuse.
    pub naive_bytes: usize,
    pub alignment: usize,
}

impl ArenaPlan {
    /// Checks that no two lifetime-overlapping requests overlap in memory.
    pub fn validate(&self, requests: &[BufferRequest]) -> Result<(), ArenaError> {
        for (i, a) in requests.iter().enumerate() {
            for (j, b) in requests.iter().enumerate().skip(i + 1) {
                if a.lifetime_overlaps(b) && self.regions[i].overlaps(&self.regions[j]) {
                    return Err(ArenaError::OverlappingRegions {
                        a: self.regions[i],
                        b: self.regions[j],
                    });
                }
            }
        }
        Ok(())
    }
}

fn align_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

/// Plans offsets for `requests`, aligning every offset to `alignment`
/// (treated as 1 when zero).
///
/// # Errors
/// Returns [`ArenaError::InvalidLifetime`] if a request's `first_use` is
/// after its `last_use`.
pub fn plan(requests: &[BufferRequest], alignment: usize) -> Result<ArenaPlan, ArenaError> {
    let alignment = alignment.max(1);
    for (index, r) in requests.iter().enumerate() {
        if r.first_use > r.last_use {
            return Err(ArenaError::InvalidLifetime {
                index,
                first_use: r.first_use,
                last_use: r.last_use,
            });
        }
    }

    // Largest first; ties broken by earliest use, then request order.
    let mut order: Vec<usize> = (0..requests.len()).collect();
    order.sort_by(|&a, &b| {
        requests[b]
            .size
            .cmp(&requests[a].size)
            .then(requests[a].first_use.cmp(&requests[b].first_use))
            .then(a.cmp(&b))
    });

    let mut regions = vec![Region::default(); requests.len()];
    let mut placed: Vec<usize> = Vec::with_capacity(requests.len());
    let mut total_bytes = 0;

    for &idx in &order {
        let req = &requests[idx];
        let size = align_up(req.size, alignment);

        let mut live: Vec<Region> = placed
            .iter()
            .filter(|&&p| requests[p].lifetime_overlaps(req))
            .map(|&p| regions[p])
            .filter(|r| r.len > 0)
            .collect();
        live.sort_by_key(|r| r.offset);

        let mut offset = 0;
        for r in &live {
            if r.offset >= offset + size {
                break;
            }
            offset = offset.max(align_up(r.end(), alignment));
        }

        regions[idx] = Region::new(offset, req.size);
        total_bytes = total_bytes.max(offset + size);
        placed.push(idx);
    }

    let naive_bytes = requests.iter().map(|r| align_up(r.size, alignment)).sum();
    tracing::debug!(
        buffers = requests.len(),
        total_bytes,
        naive_bytes,
        "arena plan computed"
    );

    Ok(ArenaPlan {
        regions,
        total_bytes,
        naive_bytes,
        alignment,
    })
}
