// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model graph: tensors plus an ordered list of operators.
//!
//! # Type-State Pattern
//!
//! The graph transitions through states enforced at compile time:
//!
//! ```text
//! ModelGraph<Loaded>    : manifest parsed, not yet checked.
//!       │  .validate()
//!       ▼
//! ModelGraph<Validated> : indices, dataflow and quantization verified.
//! ```
//!
//! The interpreter only accepts a `Model`, which only ever holds a
//! validated graph, so kernels never see dangling tensor indices.

use crate::manifest::{ModelManifest, TensorDef};
use crate::{ModelError, OperatorDef};
use std::fmt;
use tensor_core::DType;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been loaded but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated and is ready for allocation.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── ModelGraph ─────────────────────────────────────────────────────

/// The model as a tensor table and operators in execution order.
#[derive(Debug, Clone)]
pub struct ModelGraph<S: GraphState = Loaded> {
    /// Human-readable model name.
    pub name: String,
    pub description: Option<String>,
    pub tensors: Vec<TensorDef>,
    pub operators: Vec<OperatorDef>,
    pub inputs: Vec<usize>,
    pub outputs: Vec<usize>,
    /// State marker (zero-sized, compile-time only).
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl ModelGraph<Loaded> {
    /// Creates a new graph in the `Loaded` state.
    pub fn new(manifest: ModelManifest) -> Self {
        Self {
            name: manifest.name,
            description: manifest.description,
            tensors: manifest.tensors,
            operators: manifest.operators,
            inputs: manifest.inputs,
            outputs: manifest.outputs,
            _state: std::marker::PhantomData,
        }
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - There is at least one operator, one input and one output.
    /// - Every tensor has a non-zero element count, and every `U8`/`I8`
    ///   tensor carries a positive scale and a zero point inside its range.
    /// - Every index is in range.
    /// - Every operator writes exactly one tensor, and no tensor is written twice.
    /// - Constants are never written and are never graph inputs.
    /// - Every operand is a constant, a graph input, or the output of an
    ///   earlier operator.
    /// - Every graph output is produced.
    pub fn validate(self) -> Result<ModelGraph<Validated>, ModelError> {
        if self.operators.is_empty() {
            return Err(ModelError::InvalidGraph("model graph contains no operators".into()));
        }
        if self.inputs.is_empty() || self.outputs.is_empty() {
            return Err(ModelError::InvalidGraph(
                "model graph must declare at least one input and one output".into(),
            ));
        }

        let mut names = std::collections::HashSet::new();
        for t in &self.tensors {
            if !names.insert(t.name.as_str()) {
                return Err(invalid_tensor(t, "duplicate tensor name"));
            }
            if t.shape.num_elements() == 0 {
                return Err(invalid_tensor(t, "shape has zero elements"));
            }
            if t.dtype.is_quantized() {
                match t.quantization {
                    None => return Err(invalid_tensor(t, "quantized tensor has no parameters")),
                    Some(q) if !q.is_valid() => {
                        return Err(invalid_tensor(t, "quantization scale must be positive"))
                    }
                    Some(q) if !zero_point_in_range(t.dtype, q.zero_point) => {
                        return Err(invalid_tensor(t, "zero point outside dtype range"))
                    }
                    Some(_) => {}
                }
            }
        }

        let n = self.tensors.len();
        let mut available: Vec<bool> = self.tensors.iter().map(|t| t.constant).collect();
        for &i in &self.inputs {
            let t = self.tensors.get(i).ok_or_else(|| {
                ModelError::InvalidGraph(format!("graph input {i} out of range ({n} tensors)"))
            })?;
            if t.constant {
                return Err(invalid_tensor(t, "constant tensor used as graph input"));
            }
            available[i] = true;
        }

        let mut produced = vec![false; n];
        for (index, op) in self.operators.iter().enumerate() {
            let fail = |detail: String| ModelError::InvalidOperator {
                index,
                opcode: op.opcode,
                detail,
            };
            for t in op.present_inputs() {
                if t >= n {
                    return Err(fail(format!("input tensor {t} out of range")));
                }
                if !available[t] {
                    return Err(fail(format!(
                        "reads '{}' before it is produced",
                        self.tensors[t].name
                    )));
                }
            }
            if op.outputs.len() != 1 {
                return Err(fail(format!(
                    "expected exactly one output, found {}",
                    op.outputs.len()
                )));
            }
            let out = op.outputs[0];
            if out >= n {
                return Err(fail(format!("output tensor {out} out of range")));
            }
            let t = &self.tensors[out];
            if t.constant {
                return Err(fail(format!("writes constant tensor '{}'", t.name)));
            }
            if produced[out] || self.inputs.contains(&out) {
                return Err(fail(format!("tensor '{}' is produced twice", t.name)));
            }
            produced[out] = true;
            available[out] = true;
        }

        for &o in &self.outputs {
            if o >= n {
                return Err(ModelError::InvalidGraph(format!(
                    "graph output {o} out of range ({n} tensors)"
                )));
            }
            if !produced[o] {
                return Err(invalid_tensor(&self.tensors[o], "graph output is never produced"));
            }
        }

        Ok(ModelGraph {
            name: self.name,
            description: self.description,
            tensors: self.tensors,
            operators: self.operators,
            inputs: self.inputs,
            outputs: self.outputs,
            _state: std::marker::PhantomData,
        })
    }
}

fn zero_point_in_range(dtype: DType, zero_point: i32) -> bool {
    dtype
        .quantized_range()
        .map_or(true, |(lo, hi)| (lo..=hi).contains(&zero_point))
}

fn invalid_tensor(t: &TensorDef, detail: &str) -> ModelError {
    ModelError::InvalidTensor {
        tensor: t.name.clone(),
        detail: detail.to_string(),
    }
}

// ── Validated state ────────────────────────────────────────────────

impl ModelGraph<Validated> {
    /// Returns the number of operators.
    pub fn num_operators(&self) -> usize {
        self.operators.len()
    }

    /// Returns a tensor definition by index.
    pub fn tensor(&self, index: usize) -> Option<&TensorDef> {
        self.tensors.get(index)
    }

    /// Returns an operator by index.
    pub fn operator(&self, index: usize) -> Option<&OperatorDef> {
        self.operators.get(index)
    }

    /// Returns an iterator over the operators in execution order.
    pub fn iter_operators(&self) -> impl Iterator<Item = &OperatorDef> {
        self.operators.iter()
    }

    /// Total bytes of constant data.
    pub fn constant_bytes(&self) -> usize {
        self.tensors
            .iter()
            .filter(|t| t.constant)
            .map(TensorDef::size_bytes)
            .sum()
    }

    /// Sum of every non-constant tensor's size, i.e. the arena needed
    /// without any buffer reuse.
    pub fn activation_bytes(&self) -> usize {
        self.tensors
            .iter()
            .filter(|t| !t.constant)
            .map(TensorDef::size_bytes)
            .sum()
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        format!(
            "Model '{}': {} operators, {} tensors, {:.1} KB constants, {:.1} KB activations (no reuse)",
            self.name,
            self.num_operators(),
            self.tensors.len(),
            self.constant_bytes() as f64 / 1024.0,
            self.activation_bytes() as f64 / 1024.0,
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for ModelGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ModelGraph '{}' ({} operators):",
            self.name,
            self.operators.len()
        )?;
        for (i, op) in self.operators.iter().enumerate() {
            writeln!(f, "  #{i} {}", op.summary())?;
        }
        Ok(())
    }
}
