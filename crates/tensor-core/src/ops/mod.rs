// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Quantized NHWC operators.
//!
//! Each operation writes into a caller-provided output view so the
//! interpreter can run entirely out of its pre-planned arena. Activations
//! are `U8` or `I8` with per-tensor quantization. Accumulators are `i32`.

mod conv_op;
mod depthwise_conv_op;
mod fully_connected_op;
mod params;
mod pool_op;
mod reshape_op;
mod softmax_op;

pub use conv_op::conv2d;
pub use depthwise_conv_op::depthwise_conv2d;
pub use fully_connected_op::fully_connected;
pub use params::{compute_padding, Activation, ConvParams, Padding, PoolParams, WindowDim};
pub use pool_op::{average_pool2d, max_pool2d};
pub use reshape_op::reshape;
pub use softmax_op::softmax;

use crate::{QuantParams, Shape, TensorError, TensorView};

/// Returns the quantization of an 8-bit operand or the matching error.
pub(crate) fn require_quantized(
    op: &'static str,
    operand: &'static str,
    view: &TensorView<'_>,
) -> Result<QuantParams, TensorError> {
    if !view.dtype().is_quantized() {
        return Err(TensorError::UnsupportedDType {
            op,
            dtype: view.dtype(),
        });
    }
    view.quant()
        .ok_or(TensorError::MissingQuantization { op, operand })
}

/// Splits a rank-4 shape into `[n, h, w, c]`.
pub(crate) fn require_nhwc(op: &'static str, shape: &Shape) -> Result<[usize; 4], TensorError> {
    shape.as_nhwc().ok_or_else(|| TensorError::InvalidParameter {
        op,
        detail: format!("expected NHWC tensor, got {shape}"),
    })
}

/// Checks that `actual` equals the shape an operator would produce.
pub(crate) fn expect_shape(
    op: &'static str,
    expected: Shape,
    actual: &Shape,
) -> Result<(), TensorError> {
    if &expected != actual {
        return Err(TensorError::ShapeMismatch {
            op,
            lhs: expected,
            rhs: actual.clone(),
        });
    }
    Ok(())
}

/// Validates an optional `I32` bias of length `len`.
pub(crate) fn check_bias(
    op: &'static str,
    bias: Option<&TensorView<'_>>,
    len: usize,
) -> Result<(), TensorError> {
    if let Some(b) = bias {
        if b.dtype() != crate::DType::I32 {
            return Err(TensorError::UnsupportedDType {
                op,
                dtype: b.dtype(),
            });
        }
        expect_shape(op, Shape::vector(len), b.shape())?;
    }
    Ok(())
}
