// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Quantized 2-D convolution.

use super::{check_bias, compute_padding, expect_shape, require_nhwc, require_quantized, ConvParams};
use crate::{requantize, Shape, TensorError, TensorView, TensorViewMut};

const OP: &str = "conv2d";

/// Computes a quantized NHWC convolution.
///
/// - `input`: `[N, H, W, Cin]`, `U8` or `I8`
/// - `filter`: `[Cout, KH, KW, Cin]`, `U8` or `I8`
/// - `bias`: optional `[Cout]`, `I32`, scaled by `input_scale * filter_scale`
/// - `output`: `[N, OH, OW, Cout]`, `U8` or `I8`
///
/// Padded taps contribute nothing, which matches padding with the input
/// zero point.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] if the output shape is not the one
/// implied by the window geometry, and [`TensorError::InvalidParameter`] for
/// impossible strides or channel counts.
pub fn conv2d(
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
    let [out_c, k_h, k_w, f_c] = require_nhwc(OP, filter.shape())?;
    if f_c != in_c {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            lhs: input.shape().clone(),
            rhs: filter.shape().clone(),
        });
    }
    check_bias(OP, bias, out_c)?;

    let rows = compute_padding(in_h, k_h, params.stride_h, params.dilation_h, params.padding)
        .ok_or_else(|| window_error(in_h, k_h))?;
    let cols = compute_padding(in_w, k_w, params.stride_w, params.dilation_w, params.padding)
        .ok_or_else(|| window_error(in_w, k_w))?;
    expect_shape(
        OP,
        Shape::nhwc(batch, rows.output, cols.output, out_c),
        output.shape(),
    )?;

    let multiplier = in_q.scale as f64 * f_q.scale as f64 / out_q.scale as f64;
    let range = params
        .activation
        .quantized_range(output.dtype(), &out_q);

    for n in 0..batch {
        for oy in 0..rows.output {
            let iy0 = (oy * params.stride_h) as isize - rows.pad_before as isize;
            for ox in 0..cols.output {
                let ix0 = (ox * params.stride_w) as isize - cols.pad_before as isize;
                for oc in 0..out_c {
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
                            let in_base = ((n * in_h + iy as usize) * in_w + ix as usize) * in_c;
                            let f_base = ((oc * k_h + ky) * k_w + kx) * in_c;
                            for ic in 0..in_c {
                                let x = input.get_i32(in_base + ic) - in_q.zero_point;
                                let w = filter.get_i32(f_base + ic) - f_q.zero_point;
                                acc += x * w;
                            }
                        }
                    }
                    let out_idx = ((n * rows.output + oy) * cols.output + ox) * out_c + oc;
                    output.set_i32(out_idx, requantize(acc, multiplier, out_q.zero_point, range));
                }
            }
        }
    }
    Ok(())
}

fn window_error(input: usize, filter: usize) -> TensorError {
    TensorError::InvalidParameter {
        op: OP,
        detail: format!("filter extent {filter} does not fit input extent {input}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Activation, Padding};
    use crate::{DType, QuantParams, Tensor};

    fn q(scale: f32, zp: i32) -> QuantParams {
        QuantParams::new(scale, zp)
    }

    #[test]
    fn test_conv_1x1_identity() {
        // 1x1 kernel with weight 1 and unit scales copies the input.
        let input = Tensor::from_u8(Shape::nhwc(1, 2, 2, 1), &[1, 2, 3, 4])
            .unwrap()
            .with_quant(q(1.0, 0));
        let filter = Tensor::from_u8(Shape::nhwc(1, 1, 1, 1), &[1])
            .unwrap()
            .with_quant(q(1.0, 0));
        let mut out = Tensor::zeros(Shape::nhwc(1, 2, 2, 1), DType::U8).with_quant(q(1.0, 0));

        conv2d(
            &input.view(),
            &filter.view(),
            None,
            &ConvParams::default(),
            &mut out.view_mut(),
        )
        .unwrap();
        assert_eq!(out.to_i32_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_conv_3x3_same_sum() {
        // All-ones 3x3 filter over a 3x3 all-ones input with SAME padding:
        // corners see 4 taps, edges 6, centre 9.
        let input = Tensor::from_i8(Shape::nhwc(1, 3, 3, 1), &[1; 9])
            .unwrap()
            .with_quant(q(1.0, 0));
        let filter = Tensor::from_i8(Shape::nhwc(1, 3, 3, 1), &[1; 9])
            .unwrap()
            .with_quant(q(1.0, 0));
        let mut out = Tensor::zeros(Shape::nhwc(1, 3, 3, 1), DType::I8).with_quant(q(1.0, 0));

        conv2d(
            &input.view(),
            &filter.view(),
            None,
            &ConvParams::default(),
            &mut out.view_mut(),
        )
        .unwrap();
        assert_eq!(out.to_i32_vec(), vec![4, 6, 4, 6, 9, 6, 4, 6, 4]);
    }

    #[test]
    fn test_conv_bias_zero_point_and_relu() {
        // input real = q - 128 (scale 1), filter -1, bias -2 => acc = -(x) - 2.
        let input = Tensor::from_u8(Shape::nhwc(1, 1, 2, 1), &[130, 120])
            .unwrap()
            .with_quant(q(1.0, 128));
        let filter = Tensor::from_i8(Shape::nhwc(1, 1, 1, 1), &[-1])
            .unwrap()
            .with_quant(q(1.0, 0));
        let bias = Tensor::from_i32(Shape::vector(1), &[-2]).unwrap();
        let mut out = Tensor::zeros(Shape::nhwc(1, 1, 2, 1), DType::I8).with_quant(q(1.0, 0));

        let params = ConvParams {
            padding: Padding::Valid,
            activation: Activation::Relu,
            ..ConvParams::default()
        };
        conv2d(
            &input.view(),
            &filter.view(),
            Some(&bias.view()),
            &params,
            &mut out.view_mut(),
        )
        .unwrap();
        // x=2 -> -4 -> relu 0; x=-8 -> 6
        assert_eq!(out.to_i32_vec(), vec![0, 6]);
    }

    #[test]
    fn test_conv_stride_valid_output_shape() {
        let input = Tensor::zeros(Shape::nhwc(1, 5, 5, 2), DType::U8).with_quant(q(1.0, 0));
        let filter = Tensor::zeros(Shape::nhwc(4, 3, 3, 2), DType::U8).with_quant(q(1.0, 0));
        let mut out = Tensor::zeros(Shape::nhwc(1, 2, 2, 4), DType::U8).with_quant(q(1.0, 0));
        let params = ConvParams {
            stride_h: 2,
            stride_w: 2,
            padding: Padding::Valid,
            ..ConvParams::default()
        };
        conv2d(&input.view(), &filter.view(), None, &params, &mut out.view_mut()).unwrap();

        let mut wrong = Tensor::zeros(Shape::nhwc(1, 3, 3, 4), DType::U8).with_quant(q(1.0, 0));
        let err = conv2d(&input.view(), &filter.view(), None, &params, &mut wrong.view_mut());
        assert!(matches!(err, Err(TensorError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_conv_missing_quant() {
        let input = Tensor::zeros(Shape::nhwc(1, 2, 2, 1), DType::U8);
        let filter = Tensor::zeros(Shape::nhwc(1, 1, 1, 1), DType::U8).with_quant(q(1.0, 0));
        let mut out = Tensor::zeros(Shape::nhwc(1, 2, 2, 1), DType::U8).with_quant(q(1.0, 0));
        let err = conv2d(
            &input.view(),
            &filter.view(),
            None,
            &ConvParams::default(),
            &mut out.view_mut(),
        );
        assert!(matches!(
            err,
            Err(TensorError::MissingQuantization { operand: "input", .. })
        ));
    }

    #[test]
    fn test_conv_channel_mismatch() {
        let input = Tensor::zeros(Shape::nhwc(1, 2, 2, 3), DType::U8).with_quant(q(1.0, 0));
        let filter = Tensor::zeros(Shape::nhwc(1, 1, 1, 2), DType::U8).with_quant(q(1.0, 0));
        let mut out = Tensor::zeros(Shape::nhwc(1, 2, 2, 1), DType::U8).with_quant(q(1.0, 0));
        let err = conv2d(
            &input.view(),
            &filter.view(),
            None,
            &ConvParams::default(),
            &mut out.view_mut(),
        );
        assert!(matches!(err, Err(TensorError::ShapeMismatch { .. })));
    }
}
