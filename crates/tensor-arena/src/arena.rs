// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The fixed-size tensor arena.
//!
//! The arena owns a single byte buffer sized once at construction. A plan
//! from [`crate::plan`] is committed against it, after which regions are
//! handed out as slices. Nothing is allocated after construction.

use crate::{ArenaError, ArenaPlan, ArenaStats, ByteSize, Region};

/// A fixed-size scratch region holding every non-constant tensor.
///
/// # Example
/// ```
/// use tensor_arena::{plan, BufferRequest, ByteSize, TensorArena};
///
/// let reqs = [BufferRequest::new(64, 0, 0), BufferRequest::new(64, 0, 1)];
/// let p = plan(&reqs, 4).unwrap();
///
/// let mut arena = TensorArena::new(ByteSize::from_bytes(256));
/// arena.commit(&p).unwrap();
/// let (inputs, out) = arena.split_io(&[p.regions[0]], p.regions[1]).unwrap();
/// out.copy_from_slice(inputs[0]);
/// ```
#[derive(Debug)]
pub struct TensorArena {
    buffer: Vec<u8>,
    planned_bytes: usize,
    naive_bytes: usize,
    buffers: usize,
}

impl TensorArena {
    /// Allocates an arena of exactly `size` bytes. Zero is allowed.
    pub fn new(size: ByteSize) -> Self {
        Self {
            buffer: vec![0u8; size.as_bytes()],
            planned_bytes: 0,
            naive_bytes: 0,
            buffers: 0,
        }
    }

    /// Capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Accepts `plan` if it fits, and zeroes the arena.
    ///
    /// # Errors
    /// Returns [`ArenaError::OutOfMemory`] when `plan.total_bytes` exceeds
    /// the capacity. A plan with at least one buffer never fits a
    /// zero-sized arena.
    pub fn commit(&mut self, plan: &ArenaPlan) -> Result<(), ArenaError> {
        let capacity = self.capacity();
        let required = if plan.regions.is_empty() {
            0
        } else {
            plan.total_bytes.max(1)
        };
        if required > capacity {
            tracing::warn!(required, capacity, "arena plan does not fit");
            return Err(ArenaError::OutOfMemory { required, capacity });
        }
        self.buffer.fill(0);
        self.planned_bytes = plan.total_bytes;
        self.naive_bytes = plan.naive_bytes;
        self.buffers = plan.regions.len();
        tracing::debug!(
            planned = plan.total_bytes,
            capacity,
            buffers = self.buffers,
            "arena plan committed"
        );
        Ok(())
    }

    fn check(&self, region: Region) -> Result<(), ArenaError> {
        if region.end() > self.capacity() {
            return Err(ArenaError::RegionOutOfBounds {
                region,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }

    /// Read-only slice of `region`.
    pub fn region(&self, region: Region) -> Result<&[u8], ArenaError> {
        self.check(region)?;
        Ok(&self.buffer[region.offset..region.end()])
    }

    /// Mutable slice of `region`.
    pub fn region_mut(&mut self, region: Region) -> Result<&mut [u8], ArenaError> {
        self.check(region)?;
        Ok(&mut self.buffer[region.offset..region.end()])
    }

    /// Borrows the input regions of one operator immutably and its output
    /// region mutably, at the same time.
    ///
    /// # Errors
    /// Returns [`ArenaError::OverlappingRegions`] if any input shares bytes
    /// with the output, or [`ArenaError::RegionOutOfBounds`] if a region is
    /// outside the arena.
    pub fn split_io(
        &mut self,
        inputs: &[Region],
        output: Region,
    ) -> Result<(Vec<&[u8]>, &mut [u8]), ArenaError> {
        self.check(output)?;
        for &input in inputs {
            self.check(input)?;
            if input.overlaps(&output) {
                return Err(ArenaError::OverlappingRegions { a: input, b: output });
            }
        }

        let (head, rest) = self.buffer.split_at_mut(output.offset);
        let (out, tail) = rest.split_at_mut(output.len);
        let head: &[u8] = head;
        let tail: &[u8] = tail;
        let tail_start = output.end();

        let views = inputs
            .iter()
            .map(|r| {
                if r.end() <= output.offset {
                    &head[r.offset..r.end()]
                } else {
                    let start = r.offset.max(tail_start) - tail_start;
                    &tail[start..start + r.len]
                }
            })
            .collect();
        Ok((views, out))
    }

    /// Usage statistics for the committed plan.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            capacity_bytes: self.capacity(),
            planned_bytes: self.planned_bytes,
            naive_bytes: self.naive_bytes,
            buffers: self.buffers,
        }
    }
}
