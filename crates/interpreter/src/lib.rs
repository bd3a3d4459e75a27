// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # interpreter
//!
//! The micro interpreter that runs a quantized model inside a fixed arena.
//!
//! The interpreter takes:
//! - A validated [`model_ir::Model`] blob.
//! - An [`OpResolver`] holding one [`Kernel`] per supported opcode.
//! - A [`tensor_arena::TensorArena`] sized up front.
//!
//! `allocate_tensors` resolves and prepares every operator, computes tensor
//! lifetimes, and places all activations in the arena. `invoke` then runs
//! the operators in order with no further allocation of tensor memory.
//!
//! # Type-State Lifecycle
//! ```text
//! Interpreter<Unallocated> → Interpreter<Allocated>
//! ```
//! Tensor access and `invoke` exist only on `Allocated`.

mod error;
mod interpreter;
mod kernel;
pub mod kernels;
mod memory;
mod metrics;
mod resolver;

pub use error::InterpreterError;
pub use interpreter::{Allocated, Interpreter, InterpreterState, Unallocated};
pub use kernel::{EvalContext, Kernel, OpInputs};
pub use memory::{MemoryPlan, ARENA_ALIGNMENT};
pub use metrics::{InvokeMetrics, OpMetrics};
pub use resolver::OpResolver;
