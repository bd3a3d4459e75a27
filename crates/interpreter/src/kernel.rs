// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`Kernel`] trait and the per-invocation [`EvalContext`].

use model_ir::{OpCode, OperatorDef, TensorDef};
use tensor_core::{TensorError, TensorView, TensorViewMut};

/// Trait for operator implementations.
///
/// A kernel is registered in an [`crate::OpResolver`] under its
/// [`OpCode`]. The interpreter calls [`Kernel::prepare`] once per operator
/// during `allocate_tensors` and [`Kernel::eval`] on every invoke.
///
/// Kernels are stateless: everything they need comes from the operator
/// definition and the tensors in the context, so a single instance serves
/// every operator of its kind.
pub trait Kernel: Send + Sync {
    /// The opcode this kernel implements.
    fn opcode(&self) -> OpCode;

    /// Human-readable name, e.g. to tell an optimized kernel from the
    /// reference one in logs.
    fn name(&self) -> &str {
        self.opcode().as_str()
    }

    /// Checks operand count, shapes and dtypes against the tensor table.
    fn prepare(&self, op: &OperatorDef, tensors: &[TensorDef]) -> Result<(), TensorError>;

    /// Computes the operator's output.
    fn eval(&self, op: &OperatorDef, ctx: &mut EvalContext<'_>) -> Result<(), TensorError>;
}

/// The resolved operand views of one operator.
pub struct OpInputs<'c, 'a> {
    opcode: OpCode,
    slots: &'c [Option<TensorView<'a>>],
}

impl<'c, 'a> OpInputs<'c, 'a> {
    /// Input `slot`, which must be present.
    pub fn required(&self, slot: usize) -> Result<&'c TensorView<'a>, TensorError> {
        self.optional(slot).ok_or_else(|| TensorError::InvalidParameter {
            op: self.opcode.as_str(),
            detail: format!("missing required input {slot}"),
        })
    }

    /// Input `slot`, if present.
    pub fn optional(&self, slot: usize) -> Option<&'c TensorView<'a>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Operand views handed to [`Kernel::eval`]: inputs point into the model
/// blob (constants) or the arena, the output points into the arena.
pub struct EvalContext<'a> {
    opcode: OpCode,
    inputs: Vec<Option<TensorView<'a>>>,
    output: TensorViewMut<'a>,
}

impl<'a> EvalContext<'a> {
    pub fn new(opcode: OpCode, inputs: Vec<Option<TensorView<'a>>>, output: TensorViewMut<'a>) -> Self {
        Self {
            opcode,
            inputs,
            output,
        }
    }

    /// Splits the context into its inputs and the writable output.
    pub fn io(&mut self) -> (OpInputs<'_, 'a>, &mut TensorViewMut<'a>) {
        (
            OpInputs {
                opcode: self.opcode,
                slots: &self.inputs,
            },
            &mut self.output,
        )
    }
}

/// Shared `prepare` helpers.
pub(crate) mod check {
    use model_ir::{OperatorDef, TensorDef};
    use tensor_core::{DType, Shape, TensorError};

    /// Resolves a required input slot to its tensor definition.
    pub fn input<'t>(
        op: &OperatorDef,
        tensors: &'t [TensorDef],
        slot: usize,
    ) -> Result<&'t TensorDef, TensorError> {
        op.input(slot)
            .and_then(|i| tensors.get(i))
            .ok_or_else(|| TensorError::InvalidParameter {
                op: op.opcode.as_str(),
                detail: format!("missing required input {slot}"),
            })
    }

    /// Resolves an optional input slot.
    pub fn optional_input<'t>(
        op: &OperatorDef,
        tensors: &'t [TensorDef],
        slot: usize,
    ) -> Option<&'t TensorDef> {
        op.input(slot).and_then(|i| tensors.get(i))
    }

    /// Resolves the single output.
    pub fn output<'t>(op: &OperatorDef, tensors: &'t [TensorDef]) -> Result<&'t TensorDef, TensorError> {
        op.outputs
            .first()
            .and_then(|&i| tensors.get(i))
            .ok_or_else(|| TensorError::InvalidParameter {
                op: op.opcode.as_str(),
                detail: "missing output".into(),
            })
    }

    /// Requires a quantized 8-bit activation.
    pub fn quantized(op: &OperatorDef, t: &TensorDef) -> Result<(), TensorError> {
        if !t.dtype.is_quantized() {
            return Err(TensorError::UnsupportedDType {
                op: op.opcode.as_str(),
                dtype: t.dtype,
            });
        }
        Ok(())
    }

    /// Requires an `I32` bias of length `len`.
    pub fn bias(op: &OperatorDef, t: &TensorDef, len: usize) -> Result<(), TensorError> {
        if t.dtype != DType::I32 {
            return Err(TensorError::UnsupportedDType {
                op: op.opcode.as_str(),
                dtype: t.dtype,
            });
        }
        shape(op, Shape::vector(len), &t.shape)
    }

    /// Requires `actual == expected`.
    pub fn shape(op: &OperatorDef, expected: Shape, actual: &Shape) -> Result<(), TensorError> {
        if &expected != actual {
            return Err(TensorError::ShapeMismatch {
                op: op.opcode.as_str(),
                lhs: expected,
                rhs: actual.clone(),
            });
        }
        Ok(())
    }

    /// Splits a rank-4 tensor shape.
    pub fn nhwc(op: &OperatorDef, t: &TensorDef) -> Result<[usize; 4], TensorError> {
        t.shape.as_nhwc().ok_or_else(|| TensorError::InvalidParameter {
            op: op.opcode.as_str(),
            detail: format!("'{}' must be NHWC, got {}", t.name, t.shape),
        })
    }
}
