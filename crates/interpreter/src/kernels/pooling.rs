// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pooling kernels.

use crate::kernel::check;
use crate::{EvalContext, Kernel};
use model_ir::{OpCode, OperatorDef, TensorDef};
use tensor_core::{average_pool2d, compute_padding, max_pool2d, Shape, TensorError};

fn prepare_pool(op: &OperatorDef, tensors: &[TensorDef]) -> Result<(), TensorError> {
    let input = check::input(op, tensors, 0)?;
    let output = check::output(op, tensors)?;
    check::quantized(op, input)?;
    check::quantized(op, output)?;
    if input.quantization != output.quantization || input.dtype != output.dtype {
        return Err(TensorError::InvalidParameter {
            op: op.opcode.as_str(),
            detail: "input and output quantization must match".into(),
        });
    }

    let [n, h, w, c] = check::nhwc(op, input)?;
    let o = &op.options;
    let bad_window = || TensorError::InvalidParameter {
        op: op.opcode.as_str(),
        detail: format!("pooling window {}x{} does not fit {}", o.filter_h, o.filter_w, input.shape),
    };
    let rows = compute_padding(h, o.filter_h, o.stride_h, 1, o.padding).ok_or_else(bad_window)?;
    let cols = compute_padding(w, o.filter_w, o.stride_w, 1, o.padding).ok_or_else(bad_window)?;
    check::shape(op, Shape::nhwc(n, rows.output, cols.output, c), &output.shape)
}

/// Reference `AVERAGE_POOL_2D`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AveragePool2dKernel;

impl Kernel for AveragePool2dKernel {
    fn opcode(&self) -> OpCode {
        OpCode::AveragePool2d
    }

    fn prepare(&self, op: &OperatorDef, tensors: &[TensorDef]) -> Result<(), TensorError> {
        prepare_pool(op, tensors)
    }

    fn eval(&self, op: &OperatorDef, ctx: &mut EvalContext<'_>) -> Result<(), TensorError> {
        let (inputs, output) = ctx.io();
        average_pool2d(inputs.required(0)?, &op.options.pool_params(), output)
    }
}

/// Reference `MAX_POOL_2D`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxPool2dKernel;

impl Kernel for MaxPool2dKernel {
    fn opcode(&self) -> OpCode {
        OpCode::MaxPool2d
    }

    fn prepare(&self, op: &OperatorDef, tensors: &[TensorDef]) -> Result<(), TensorError> {
        prepare_pool(op, tensors)
    }

    fn eval(&self, op: &OperatorDef, ctx: &mut EvalContext<'_>) -> Result<(), TensorError> {
        let (inputs, output) = ctx.io();
        max_pool2d(inputs.required(0)?, &op.options.pool_params(), output)
    }
}
