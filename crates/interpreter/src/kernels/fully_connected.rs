// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fully connected kernel.

use crate::kernel::check;
use crate::{EvalContext, Kernel};
use model_ir::{OpCode, OperatorDef, TensorDef};
use tensor_core::{fully_connected, Shape, TensorError};

/// Reference `FULLY_CONNECTED`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullyConnectedKernel;

impl Kernel for FullyConnectedKernel {
    fn opcode(&self) -> OpCode {
        OpCode::FullyConnected
    }

    fn prepare(&self, op: &OperatorDef, tensors: &[TensorDef]) -> Result<(), TensorError> {
        let input = check::input(op, tensors, 0)?;
        let weights = check::input(op, tensors, 1)?;
        let output = check::output(op, tensors)?;
        check::quantized(op, input)?;
        check::quantized(op, weights)?;
        check::quantized(op, output)?;

        let (n, k) = match weights.shape.dims() {
            &[n, k] => (n, k),
            _ => {
                return Err(TensorError::InvalidParameter {
                    op: "fully_connected",
                    detail: format!("weights must be rank 2, got {}", weights.shape),
                })
            }
        };
        let total = input.shape.num_elements();
        if k == 0 || total % k != 0 {
            return Err(TensorError::ShapeMismatch {
                op: "fully_connected",
                lhs: input.shape.clone(),
                rhs: weights.shape.clone(),
            });
        }
        if let Some(bias) = check::optional_input(op, tensors, 2) {
            check::bias(op, bias, n)?;
        }
        check::shape(op, Shape::matrix(total / k, n), &output.shape)
    }

    fn eval(&self, op: &OperatorDef, ctx: &mut EvalContext<'_>) -> Result<(), TensorError> {
        let (inputs, output) = ctx.io();
        fully_connected(
            inputs.required(0)?,
            inputs.required(1)?,
            inputs.optional(2),
            op.options.activation,
            output,
        )
    }
}
