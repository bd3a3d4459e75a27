// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Softmax kernel.

use crate::kernel::check;
use crate::{EvalContext, Kernel};
use model_ir::{OpCode, OperatorDef, TensorDef};
use tensor_core::{softmax, TensorError};

/// Reference `SOFTMAX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftmaxKernel;

impl Kernel for SoftmaxKernel {
    fn opcode(&self) -> OpCode {
        OpCode::Softmax
    }

    fn prepare(&self, op: &OperatorDef, tensors: &[TensorDef]) -> Result<(), TensorError> {
        let input = check::input(op, tensors, 0)?;
        let output = check::output(op, tensors)?;
        check::quantized(op, input)?;
        check::quantized(op, output)?;
        if !op.options.beta.is_finite() {
            return Err(TensorError::InvalidParameter {
                op: "softmax",
                detail: format!("beta must be finite, got {}", op.options.beta),
            });
        }
        check::shape(op, input.shape.clone(), &output.shape)
    }

    fn eval(&self, op: &OperatorDef, ctx: &mut EvalContext<'_>) -> Result<(), TensorError> {
        let (inputs, output) = ctx.io();
        softmax(inputs.required(0)?, op.options.beta, output)
    }
}
