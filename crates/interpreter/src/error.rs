// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the interpreter.

use model_ir::OpCode;

/// Errors that can occur while resolving, allocating or invoking a model.
#[derive(Debug, thiserror::Error)]
pub enum InterpreterError {
    /// The model blob or its graph is unusable.
    #[error("model error: {0}")]
    Model(#[from] model_ir::ModelError),

    /// The arena could not hold the plan, or a region was out of range.
    #[error("arena error: {0}")]
    Arena(#[from] tensor_arena::ArenaError),

    /// A tensor view could not be built over its buffer.
    #[error("tensor error: {0}")]
    Tensor(#[from] tensor_core::TensorError),

    /// No kernel is registered for an operator's opcode.
    #[error("operator #{index}: no kernel registered for {opcode}")]
    UnsupportedOp { index: usize, opcode: OpCode },

    /// The resolver already holds `capacity` kernels.
    #[error("op resolver is full (capacity {capacity})")]
    ResolverFull { capacity: usize },

    /// A kernel for this opcode is already registered.
    #[error("a kernel for {opcode} is already registered")]
    DuplicateOp { opcode: OpCode },

    /// A kernel rejected its operator during `allocate_tensors`.
    #[error("operator #{index} ({opcode}) failed to prepare: {source}")]
    Prepare {
        index: usize,
        opcode: OpCode,
        #[source]
        source: tensor_core::TensorError,
    },

    /// A kernel failed while computing its output.
    #[error("operator #{index} ({opcode}) failed to evaluate: {source}")]
    Eval {
        index: usize,
        opcode: OpCode,
        #[source]
        source: tensor_core::TensorError,
    },

    /// A graph input or output index is out of range.
    #[error("{kind} index {index} out of range (model has {len})")]
    BadTensorIndex {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// The tensor has no arena region (it is a constant or unused).
    #[error("tensor '{tensor}' has no arena region")]
    NotInArena { tensor: String },
}
