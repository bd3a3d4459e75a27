// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The interpreter with a type-state enforced lifecycle.
//!
//! ```text
//! Interpreter<Unallocated>
//!     │  .allocate_tensors()
//!     ▼
//! Interpreter<Allocated>
//!     │  .input_mut(0) ... .invoke() ... .output(0)
//!     ▼
//!   InvokeMetrics
//! ```
//!
//! Allocation consumes the unallocated interpreter, so tensors cannot be
//! accessed or invoked before the arena is planned.

use crate::{EvalContext, InterpreterError, InvokeMetrics, MemoryPlan, OpResolver};
use model_ir::{Model, ModelError};
use tensor_arena::{ArenaStats, Region, TensorArena};
use tensor_core::{TensorView, TensorViewMut};
use std::time::Instant;

// ── Type-state markers ─────────────────────────────────────────

/// Kernels not yet resolved, arena not yet planned.
#[derive(Debug)]
pub struct Unallocated;

/// Kernels resolved and prepared, arena committed.
#[derive(Debug)]
pub struct Allocated {
    /// Resolver slot of each operator's kernel.
    kernels: Vec<usize>,
    memory: MemoryPlan,
}

/// Sealed trait for interpreter states.
pub trait InterpreterState: std::fmt::Debug {}
impl InterpreterState for Unallocated {}
impl InterpreterState for Allocated {}

// ── Interpreter ────────────────────────────────────────────────

/// Runs a [`Model`] with kernels from an [`OpResolver`] inside a
/// fixed-size [`TensorArena`].
///
/// # Example
/// ```no_run
/// use interpreter::{Interpreter, OpResolver};
/// use model_ir::Model;
/// use tensor_arena::{ByteSize, TensorArena};
///
/// # fn example() -> Result<(), interpreter::InterpreterError> {
/// let model = Model::open("model.fim")?;
/// let mut interp = Interpreter::new(
///     model,
///     OpResolver::with_builtins(),
///     TensorArena::new(ByteSize::from_kb(128)),
/// )
/// .allocate_tensors()?;
/// interp.input_mut(0)?.as_bytes_mut().fill(0);
/// let metrics = interp.invoke()?;
/// println!("{} -> {:?}", metrics.summary(), interp.output(0)?.get_i32(0));
/// # Ok(())
/// # }
/// ```
pub struct Interpreter<S: InterpreterState = Unallocated> {
    model: Model,
    resolver: OpResolver,
    arena: TensorArena,
    state: S,
}

// ── Unallocated → Allocated ────────────────────────────────────

impl Interpreter<Unallocated> {
    pub fn new(model: Model, resolver: OpResolver, arena: TensorArena) -> Self {
        tracing::debug!(
            model = model.name(),
            kernels = resolver.len(),
            arena = arena.capacity(),
            "interpreter created"
        );
        Self {
            model,
            resolver,
            arena,
            state: Unallocated,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Resolves and prepares every operator, then plans and commits the
    /// arena.
    ///
    /// Fails on the first operator with no registered kernel, on the first
    /// kernel that rejects its operator, or when the plan does not fit the
    /// arena.
    pub fn allocate_tensors(self) -> Result<Interpreter<Allocated>, InterpreterError> {
        let graph = self.model.graph();
        let mut kernels = Vec::with_capacity(graph.num_operators());

        for (index, op) in graph.iter_operators().enumerate() {
            let opcode = op.opcode;
            let (slot, kernel) = self
                .resolver
                .index_of(opcode)
                .and_then(|slot| self.resolver.kernel(slot).map(|k| (slot, k)))
                .ok_or(InterpreterError::UnsupportedOp { index, opcode })?;
            kernel
                .prepare(op, &graph.tensors)
                .map_err(|source| InterpreterError::Prepare {
                    index,
                    opcode,
                    source,
                })?;
            tracing::trace!(index, %opcode, kernel = kernel.name(), "operator prepared");
            kernels.push(slot);
        }

        let memory = MemoryPlan::new(graph)?;
        let mut arena = self.arena;
        arena.commit(memory.arena_plan())?;
        tracing::info!("{}", arena.stats().summary());

        Ok(Interpreter {
            model: self.model,
            resolver: self.resolver,
            arena,
            state: Allocated { kernels, memory },
        })
    }
}

// ── Allocated: tensor access and invoke ────────────────────────

impl Interpreter<Allocated> {
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn inputs_len(&self) -> usize {
        self.model.graph().inputs.len()
    }

    pub fn outputs_len(&self) -> usize {
        self.model.graph().outputs.len()
    }

    pub fn arena_stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    pub fn memory_plan(&self) -> &MemoryPlan {
        &self.state.memory
    }

    /// Read-only view of graph input `i`.
    pub fn input(&self, i: usize) -> Result<TensorView<'_>, InterpreterError> {
        let t = self.graph_tensor("input", i)?;
        self.view(t)
    }

    /// Writable view of graph input `i`; fill it before [`Self::invoke`].
    pub fn input_mut(&mut self, i: usize) -> Result<TensorViewMut<'_>, InterpreterError> {
        let t = self.graph_tensor("input", i)?;
        let region = self.region(t)?;
        let def = &self.model.graph().tensors[t];
        let data = self.arena.region_mut(region)?;
        Ok(TensorViewMut::new(&def.shape, def.dtype, def.quantization, data)?)
    }

    /// View of graph output `i`; valid after [`Self::invoke`].
    pub fn output(&self, i: usize) -> Result<TensorView<'_>, InterpreterError> {
        let t = self.graph_tensor("output", i)?;
        self.view(t)
    }

    /// Runs every operator in order.
    pub fn invoke(&mut self) -> Result<InvokeMetrics, InterpreterError> {
        let start = Instant::now();
        let Self {
            model,
            resolver,
            arena,
            state,
        } = self;
        let model: &Model = model;
        let graph = model.graph();
        let mut metrics = InvokeMetrics::new(graph.num_operators());

        for (index, (op, &slot)) in graph.iter_operators().zip(&state.kernels).enumerate() {
            let opcode = op.opcode;
            let kernel = resolver
                .kernel(slot)
                .ok_or(InterpreterError::UnsupportedOp { index, opcode })?;
            let eval_err = |source| InterpreterError::Eval {
                index,
                opcode,
                source,
            };

            let out_t = op.output();
            let out_def = &graph.tensors[out_t];
            let out_region = arena_region(&state.memory, out_def, out_t)?;
            let mut in_regions = Vec::with_capacity(op.inputs.len());
            for t in op.present_inputs() {
                let def = &graph.tensors[t];
                if !def.constant {
                    in_regions.push(arena_region(&state.memory, def, t)?);
                }
            }

            let (in_bufs, out_buf) = arena.split_io(&in_regions, out_region)?;
            let mut in_bufs = in_bufs.into_iter();
            let mut inputs = Vec::with_capacity(op.inputs.len());
            for slot in &op.inputs {
                let Some(t) = *slot else {
                    inputs.push(None);
                    continue;
                };
                let def = &graph.tensors[t];
                let view = if def.constant {
                    model
                        .constant_view(t)
                        .ok_or_else(|| ModelError::ConstantNotFound {
                            name: def.name.clone(),
                        })?
                } else {
                    let data = in_bufs.next().ok_or_else(|| InterpreterError::NotInArena {
                        tensor: def.name.clone(),
                    })?;
                    TensorView::new(&def.shape, def.dtype, def.quantization, data).map_err(eval_err)?
                };
                inputs.push(Some(view));
            }
            let output = TensorViewMut::new(&out_def.shape, out_def.dtype, out_def.quantization, out_buf)
                .map_err(eval_err)?;

            let mut ctx = EvalContext::new(opcode, inputs, output);
            let op_start = Instant::now();
            kernel.eval(op, &mut ctx).map_err(eval_err)?;
            let elapsed = op_start.elapsed();
            tracing::trace!(index, %opcode, us = elapsed.as_micros() as u64, "operator evaluated");
            metrics.record_op(index, opcode, kernel.name(), elapsed);
        }

        metrics.finalise(start.elapsed());
        tracing::debug!("{}", metrics.summary());
        Ok(metrics)
    }

    // ── Private helpers ────────────────────────────────────────

    fn graph_tensor(&self, kind: &'static str, i: usize) -> Result<usize, InterpreterError> {
        let graph = self.model.graph();
        let list = if kind == "input" {
            &graph.inputs
        } else {
            &graph.outputs
        };
        list.get(i).copied().ok_or(InterpreterError::BadTensorIndex {
            kind,
            index: i,
            len: list.len(),
        })
    }

    fn region(&self, t: usize) -> Result<Region, InterpreterError> {
        let def = &self.model.graph().tensors[t];
        arena_region(&self.state.memory, def, t)
    }

    fn view(&self, t: usize) -> Result<TensorView<'_>, InterpreterError> {
        let region = self.region(t)?;
        let def = &self.model.graph().tensors[t];
        let data = self.arena.region(region)?;
        Ok(TensorView::new(&def.shape, def.dtype, def.quantization, data)?)
    }
}

fn arena_region(
    memory: &MemoryPlan,
    def: &model_ir::TensorDef,
    t: usize,
) -> Result<Region, InterpreterError> {
    memory.region(t).ok_or_else(|| InterpreterError::NotInArena {
        tensor: def.name.clone(),
    })
}

impl<S: InterpreterState> std::fmt::Debug for Interpreter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("state", &std::any::type_name::<S>())
            .field("model", &self.model.name())
            .field("resolver", &self.resolver)
            .field("arena_bytes", &self.arena.capacity())
            .finish()
    }
}
