// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Quantized depthwise 2-D convolution.

use super::{check_bias, compute_padding, expect_shape, require_nhwc, require_quantized, ConvParams};
use crate::{requantize, Shape, TensorError, TensorView, TensorViewMut};

const OP: &str = "depthwise_conv2d";

/// Computes a quantized NHWC depthwise convolution.
///
/// The filter is `[1, KH, KW, Cin * M]` where `M` is
/// `params.depth_multiplier`. Output channel `ic * M + m` is produced from
/// input channel `ic` alone.
pub fn depthwise_conv2d(
    input: &TensorView<'_>,
    filter: &TensorView<'_>,
    bias: Option<&TensorView<'_>>,
    params: &ConvParams,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    let in_q = require_quantized(OP, "input", input)?;
    let f_q = require_quantized(OP, "filter", filter)?;
    let out_q = require_quantized(OP, "output", &output.as_view())?;

    let [batch, in_h, in_w, in_c] = require_nhwc(OP, input.shape())?;
    let [one, k_h, k_w, f_c] = require_nhwc(OP, filter.shape())?;
    let mult = params.depth_multiplier;
    if one != 1 || mult == 0 || f_c != in_c * mult {
        return Err(TensorError::InvalidParameter {
            op: OP,
            detail: format!(
                "filter {} incompatible with {} input channels and depth multiplier {}",
                filter.shape(),
                in_c,
                mult
            ),
        });
    }
    let out_c = f_c;
    check_bias(OP, bias, out_c)?;

    let rows = compute_padding(in_h, k_h, params.stride_h, params.dilation_h, params.padding)
        .ok_or_else(|| TensorError::InvalidParameter {
            op: OP,
            detail: format!("bad window along height: input {in_h}, filter {k_h}"),
        })?;
    let cols = compute_padding(in_w, k_w, params.stride_w, params.dilation_w, params.padding)
        .ok_or_else(|| TensorError::InvalidParameter {
            op: OP,
            detail: format!("bad window along width: input {in_w}, filter {k_w}"),
        })?;
    expect_shape(
        OP,
        Shape::nhwc(batch, rows.output, cols.output, out_c),
        output.shape(),
    )?;

    let multiplier = in_q.scale as f64 * f_q.scale as f64 / out_q.scale as f64;
    let range = params.activation.quantized_range(output.dtype(), &out_q);

    for n in 0..batch {
        for oy in 0..rows.output {
            let iy0 = (oy * params.stride_h) as isize - rows.pad_before as isize;
            for ox in 0..cols.output {
                let ix0 = (ox * params.stride_w) as isize - cols.pad_before as isize;
                for ic in 0..in_c {
                    for m in 0..mult {
                        let oc = ic * mult + m;
                        let mut acc: i32 = bias.map_or(0, |b| b.get_i32(oc));
                        for ky in 0..k_h {
                            let iy = iy0 + (ky * params.dilation_h) as isize;
                            if iy < 0 || iy >= in_h as isize {
                                continue;
                            }
                            for kx in 0..k_w {
                                let ix = ix0 + (kx * params.dilation_w) as isize;
                                if ix < 0 || ix >= in_w as isize {
                                    continue;
                                }
                                let in_idx =
                                    ((n * in_h + iy as usize) * in_w + ix as usize) * in_c + ic;
                                let f_idx = (ky * k_w + kx) * out_c + oc;
                                let x = input.get_i32(in_idx) - in_q.zero_point;
                                let w = filter.get_i32(f_idx) - f_q.zero_point;
                                acc += x * w;
                            }
                        }
                        let out_idx = ((n * rows.output + oy) * cols.output + ox) * out_c + oc;
                        output.set_i32(out_idx, requantize(acc, multiplier, out_q.zero_point, range));
                    }
                }
            }
        }
    }
    Ok(())
}
