// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reshape kernel.

use crate::kernel::check;
use crate::{EvalContext, Kernel};
use model_ir::{OpCode, OperatorDef, TensorDef};
use tensor_core::{reshape, TensorError};

/// Reference `RESHAPE`. The output tensor's declared shape is authoritative;
/// an explicit `new_shape` option must agree with it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReshapeKernel;

impl Kernel for ReshapeKernel {
    fn opcode(&self) -> OpCode {
        OpCode::Reshape
    }

    fn prepare(&self, op: &OperatorDef, tensors: &[TensorDef]) -> Result<(), TensorError> {
        let input = check::input(op, tensors, 0)?;
        let output = check::output(op, tensors)?;
        if input.shape.num_elements() != output.shape.num_elements() {
            return Err(TensorError::ShapeMismatch {
                op: "reshape",
                lhs: input.shape.clone(),
                rhs: output.shape.clone(),
            });
        }
        if input.dtype != output.dtype {
            return Err(TensorError::UnsupportedDType {
                op: "reshape",
                dtype: output.dtype,
            });
        }
        if let Some(dims) = &op.options.new_shape {
            if dims.as_slice() != output.shape.dims() {
                return Err(TensorError::InvalidParameter {
                    op: "reshape",
                    detail: format!("new_shape {dims:?} disagrees with output {}", output.shape),
                });
            }
        }
        Ok(())
    }

    fn eval(&self, _op: &OperatorDef, ctx: &mut EvalContext<'_>) -> Result<(), TensorError> {
        let (inputs, output) = ctx.io();
        reshape(inputs.required(0)?, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::test_util::{op, q8};
    use model_ir::OpOptions;

    #[test]
    fn test_prepare_new_shape_must_agree() {
        let tensors = vec![q8("in", vec![1, 2, 2, 4]), q8("out", vec![1, 16])];
        let mut opts = OpOptions {
            new_shape: Some(vec![1, 16]),
            ..OpOptions::default()
        };
        let o = op(OpCode::Reshape, vec![Some(0)], 1, opts.clone());
        ReshapeKernel.prepare(&o, &tensors).unwrap();

        opts.new_shape = Some(vec![16, 1]);
        let o = op(OpCode::Reshape, vec![Some(0)], 1, opts);
        assert!(ReshapeKernel.prepare(&o, &tensors).is_err());
    }

    #[test]
    fn test_prepare_count_mismatch() {
        let tensors = vec![q8("in", vec![1, 2, 2, 4]), q8("out", vec![1, 15])];
        let o = op(OpCode::Reshape, vec![Some(0)], 1, OpOptions::default());
        assert!(ReshapeKernel.prepare(&o, &tensors).is_err());
    }
}
