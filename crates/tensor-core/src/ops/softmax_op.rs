// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Quantized softmax activation.

use super::require_quantized;
use crate::{TensorError, TensorView, TensorViewMut};

const OP: &str = "softmax";

/// Computes softmax along the last dimension:
/// `output[i] = exp(beta * (x[i] - max)) / sum(exp(beta * (x - max)))`.
///
/// Input values are dequantized, the numerically stable softmax is
/// evaluated in `f32`, and the probabilities are quantized with the
/// output's parameters (typically scale `1/256`).
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if input and output shapes differ.
/// Returns [`TensorError::UnsupportedDType`] if either side is not `U8`/`I8`.
pub fn softmax(
    input: &TensorView<'_>,
    beta: f32,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    let in_q = require_quantized(OP, "input", input)?;
    let out_q = require_quantized(OP, "output", &output.as_view())?;

    if input.shape() != output.shape() {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }

    let last_dim = input.shape().last_dim();
    if last_dim == 0 {
        return Ok(());
    }

    let out_dtype = output.dtype();
    let num_rows = input.len() / last_dim;
    let mut scratch = vec![0.0f32; last_dim];

    for row in 0..num_rows {
        let offset = row * last_dim;

        // Largest quantized value is also the largest real value.
        let max_q = (0..last_dim)
            .map(|i| input.get_i32(offset + i))
            .max()
            .unwrap_or(in_q.zero_point);

        let mut sum = 0.0f32;
        for (i, e) in scratch.iter_mut().enumerate() {
            let diff = (input.get_i32(offset + i) - max_q) as f32 * in_q.scale;
            *e = (beta * diff).exp();
            sum += *e;
        }

        let inv_sum = if sum > 0.0 { 1.0 / sum } else { 0.0 };
        for (i, e) in scratch.iter().enumerate() {
            output.set_i32(offset + i, out_q.quantize(e * inv_sum, out_dtype));
        }
    }

    Ok(())
}
