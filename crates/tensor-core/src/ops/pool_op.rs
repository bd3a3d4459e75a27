// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Quantized average and max pooling.

use super::{compute_padding, expect_shape, require_nhwc, require_quantized, PoolParams, WindowDim};
use crate::{Shape, TensorError, TensorView, TensorViewMut};

struct Geometry {
    batch: usize,
    in_h: usize,
    in_w: usize,
    channels: usize,
    rows: WindowDim,
    cols: WindowDim,
    range: (i32, i32),
}

fn prepare(
    op: &'static str,
    input: &TensorView<'_>,
    params: &PoolParams,
    output: &TensorViewMut<'_>,
) -> Result<Geometry, TensorError> {
    let in_q = require_quantized(op, "input", input)?;
    let out_q = require_quantized(op, "output", &output.as_view())?;
    if in_q != out_q || input.dtype() != output.dtype() {
        return Err(TensorError::InvalidParameter {
            op,
            detail: "input and output quantization must match".into(),
        });
    }
    let [batch, in_h, in_w, channels] = require_nhwc(op, input.shape())?;
    let rows = compute_padding(in_h, params.filter_h, params.stride_h, 1, params.padding)
        .ok_or_else(|| TensorError::InvalidParameter {
            op,
            detail: format!("bad pooling window {}x{}", params.filter_h, params.filter_w),
        })?;
    let cols = compute_padding(in_w, params.filter_w, params.stride_w, 1, params.padding)
        .ok_or_else(|| TensorError::InvalidParameter {
            op,
            detail: format!("bad pooling window {}x{}", params.filter_h, params.filter_w),
        })?;
    expect_shape(
        op,
        Shape::nhwc(batch, rows.output, cols.output, channels),
        output.shape(),
    )?;
    Ok(Geometry {
        batch,
        in_h,
        in_w,
        channels,
        rows,
        cols,
        range: params.activation.quantized_range(output.dtype(), &out_q),
    })
}

/// Clips the window `[start, start + filter)` to `[0, extent)`.
fn clip(start: isize, filter: usize, extent: usize) -> (usize, usize) {
    let lo = start.max(0) as usize;
    let hi = (start + filter as isize).clamp(0, extent as isize) as usize;
    (lo, hi)
}

fn pool<F>(
    op: &'static str,
    input: &TensorView<'_>,
    params: &PoolParams,
    output: &mut TensorViewMut<'_>,
    reduce: F,
) -> Result<(), TensorError>
where
    F: Fn(&mut dyn Iterator<Item = i32>) -> Option<i32>,
{
    let g = prepare(op, input, params, output)?;
    for n in 0..g.batch {
        for oy in 0..g.rows.output {
            let sy = (oy * params.stride_h) as isize - g.rows.pad_before as isize;
            let (y0, y1) = clip(sy, params.filter_h, g.in_h);
            for ox in 0..g.cols.output {
                let sx = (ox * params.stride_w) as isize - g.cols.pad_before as isize;
                let (x0, x1) = clip(sx, params.filter_w, g.in_w);
                for c in 0..g.channels {
                    let mut taps = (y0..y1).flat_map(|y| {
                        (x0..x1).map(move |x| ((n * g.in_h + y) * g.in_w + x) * g.channels + c)
                    })
                    .map(|idx| input.get_i32(idx));
                    // Windows entirely in the padding produce the range floor.
                    let value = reduce(&mut taps).unwrap_or(g.range.0);
                    let out_idx = ((n * g.rows.output + oy) * g.cols.output + ox) * g.channels + c;
                    output.set_i32(out_idx, value.clamp(g.range.0, g.range.1));
                }
            }
        }
    }
    Ok(())
}

/// Average pooling over NHWC input. Padded taps are excluded from the mean.
pub fn average_pool2d(
    input: &TensorView<'_>,
    params: &PoolParams,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    pool("average_pool2d", input, params, output, |taps| {
        let (sum, count) = taps.fold((0i64, 0i64), |(s, c), v| (s + v as i64, c + 1));
        if count == 0 {
            return None;
        }
        // Round half away from zero.
        let half = count / 2;
        let avg = if sum >= 0 {
            (sum + half) / count
        } else {
            (sum - half) / count
        };
        Some(avg as i32)
    })
}

/// Max pooling over NHWC input.
pub fn max_pool2d(
    input: &TensorView<'_>,
    params: &PoolParams,
    output: &mut TensorViewMut<'_>,
) -> Result<(), TensorError> {
    pool("max_pool2d", input, params, output, |taps| taps.max())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{Activation, Padding};
    use crate::{DType, QuantParams, Tensor};

    fn params(filter: usize, stride: usize, padding: Padding) -> PoolParams {
        PoolParams {
            filter_h: filter,
            filter_w: filter,
            stride_h: stride,
            stride_w: stride,
            padding,
            activation: Activation::None,
        }
    }

    fn input_4x4() -> Tensor {
        #[rustfmt::skip]
        let values = [
            1, 2, 3, 4,
            5, 6, 7, 8,
            9, 10, 11, 12,
            13, 14, 15, 16,
        ];
        Tensor::from_u8(Shape::nhwc(1, 4, 4, 1), &values)
            .unwrap()
            .with_quant(QuantParams::new(0.5, 0))
    }

    #[test]
    fn test_max_pool_2x2() {
        let input = input_4x4();
        let mut out =
            Tensor::zeros(Shape::nhwc(1, 2, 2, 1), DType::U8).with_quant(QuantParams::new(0.5, 0));
        max_pool2d(&input.view(), &params(2, 2, Padding::Valid), &mut out.view_mut()).unwrap();
        assert_eq!(out.to_i32_vec(), vec![6, 8, 14, 16]);
    }

    #[test]
    fn test_avg_pool_2x2_rounds() {
        let input = input_4x4();
        let mut out =
            Tensor::zeros(Shape::nhwc(1, 2, 2, 1), DType::U8).with_quant(QuantParams::new(0.5, 0));
        average_pool2d(&input.view(), &params(2, 2, Padding::Valid), &mut out.view_mut())
            .unwrap();
        // (1+2+5+6)/4 = 3.5 -> 4 ; (3+4+7+8)/4 = 5.5 -> 6 ; 11.5 -> 12 ; 13.5 -> 14
        assert_eq!(out.to_i32_vec(), vec![4, 6, 12, 14]);
    }

    #[test]
    fn test_avg_pool_same_excludes_padding() {
        // 3x3 SAME on a 2x2 input of 4s: every window averages only real taps.
        let input = Tensor::from_i8(Shape::nhwc(1, 2, 2, 1), &[4; 4])
            .unwrap()
            .with_quant(QuantParams::new(1.0, 0));
        let mut out =
            Tensor::zeros(Shape::nhwc(1, 2, 2, 1), DType::I8).with_quant(QuantParams::new(1.0, 0));
        average_pool2d(&input.view(), &params(3, 1, Padding::Same), &mut out.view_mut())
            .unwrap();
        assert_eq!(out.to_i32_vec(), vec![4; 4]);
    }

    #[test]
    fn test_avg_pool_negative_rounding() {
        let input = Tensor::from_i8(Shape::nhwc(1, 1, 2, 1), &[-1, -2])
            .unwrap()
            .with_quant(QuantParams::new(1.0, 0));
        let mut out =
            Tensor::zeros(Shape::nhwc(1, 1, 1, 1), DType::I8).with_quant(QuantParams::new(1.0, 0));
        let p = PoolParams {
            filter_h: 1,
            filter_w: 2,
            stride_h: 1,
            stride_w: 2,
            padding: Padding::Valid,
            activation: Activation::None,
        };
        average_pool2d(&input.view(), &p, &mut out.view_mut()).unwrap();
        assert_eq!(out.to_i32_vec(), vec![-2]);
    }

    #[test]
    fn test_pool_quant_mismatch() {
        let input = input_4x4();
        let mut out =
            Tensor::zeros(Shape::nhwc(1, 2, 2, 1), DType::U8).with_quant(QuantParams::new(1.0, 0));
        let err = max_pool2d(&input.view(), &params(2, 2, Padding::Valid), &mut out.view_mut());
        assert!(matches!(err, Err(TensorError::InvalidParameter { .. })));
    }
}
