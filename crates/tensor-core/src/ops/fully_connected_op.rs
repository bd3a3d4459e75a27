// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Quantized fully connected (dense) layer.

use super::{check_bias, expect_shape, require_quantized, Activation};
use crate::{requantize, Shape, TensorError, TensorView, TensorViewMut};

const OP: &str = "fully_connected";

/// Computes `output = input · weightsᵀ + bias`.
///
/// `input` is flattened to `[B, K]` where `K` is the weights' inner
/// dimension. `weights` is `[N, K]` and `output` must be `[B, N]`.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if the input element count is not
/// a multiple of `K` or the output is not `[B, N]`.
pub fn fully_connected(
    input: &TensorView<'_>,
    weights: &TensorView<'_>,
    bias: Option<&TensorView<'_>>,
    activation: Activation,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    let in_q = require_quantized(OP, "input", input)?;
    let w_q = require_quantized(OP, "weights", weights)?;
    let out_q = require_quantized(OP, "output", &output.as_view())?;

    let w_dims = weights.shape().dims();
    if w_dims.len() != 2 {
        return Err(TensorError::InvalidParameter {
            op: OP,
            detail: format!("weights must be rank 2, got {}", weights.shape()),
        });
    }
    let (n, k) = (w_dims[0], w_dims[1]);
    let total = input.len();
    if k == 0 || total % k != 0 {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            lhs: input.shape().clone(),
            rhs: weights.shape().clone(),
        });
    }
    let batch = total / k;
    check_bias(OP, bias, n)?;
    expect_shape(OP, Shape::matrix(batch, n), output.shape())?;

    let multiplier = in_q.scale as f64 * w_q.scale as f64 / out_q.scale as f64;
    let range = activation.quantized_range(output.dtype(), &out_q);

    // Row-major weights make the inner loop a dot product over contiguous K.
    for b in 0..batch {
        let in_row = b * k;
        for j in 0..n {
            let w_row = j * k;
            let mut acc: i32 = bias.map_or(0, |t| t.get_i32(j));
            for p in 0..k {
                let x = input.get_i32(in_row + p) - in_q.zero_point;
                let w = weights.get_i32(w_row + p) - w_q.zero_point;
                acc += x * w;
            }
            output.set_i32(b * n + j, requantize(acc, multiplier, out_q.zero_point, range));
        }
    }
    Ok(())
}
