// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-arena
//!
//! A fixed-size arena for the intermediate tensors of a model, with the
//! offsets computed ahead of time.
//!
//! # Key Components
//!
//! - [`ByteSize`]: arena capacity with human-readable parsing (`"96K"`,
//!   `"1M"`, etc.).
//! - [`plan`]: greedy planner: buffers with disjoint lifetimes share bytes.
//! - [`TensorArena`]: owns the bytes, accepts a plan if it fits, and hands
//!   out region slices. [`TensorArena::split_io`] lends an operator's inputs
//!   and output simultaneously without `unsafe`.
//! - [`ArenaStats`]: planned vs. naive footprint.
//!
//! # Lifecycle
//!
//! ```text
//! Vec<BufferRequest> ──plan()──► ArenaPlan ──commit()──► TensorArena
//!                                                          │
//!                                       region()/split_io()│ per operator
//!                                                          ▼
//!                                                       &[u8] / &mut [u8]
//! ```

mod arena;
mod budget;
mod error;
mod planner;
mod stats;

pub use arena::TensorArena;
pub use budget::ByteSize;
pub use error::ArenaError;
pub use planner::{plan, ArenaPlan, BufferRequest, Region};
pub use stats::ArenaStats;
