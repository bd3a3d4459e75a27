// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Convolution kernels.

use crate::kernel::check;
use crate::{EvalContext, Kernel};
use model_ir::{OpCode, OperatorDef, TensorDef};
use tensor_core::{compute_padding, conv2d, depthwise_conv2d, Shape, TensorError};

/// Computes the expected NHWC output shape of a convolution.
fn conv_output_shape(
    op: &OperatorDef,
    input: [usize; 4],
    k_h: usize,
    k_w: usize,
    out_c: usize,
) -> Result<Shape, TensorError> {
    let o = &op.options;
    let [n, h, w, _] = input;
    let window = |extent, filter, stride, dilation| {
        compute_padding(extent, filter, stride, dilation, o.padding).ok_or_else(|| {
            TensorError::InvalidParameter {
                op: op.opcode.as_str(),
                detail: format!(
                    "filter {filter} (stride {stride}, dilation {dilation}) does not fit extent {extent}"
                ),
            }
        })
    };
    let rows = window(h, k_h, o.stride_h, o.dilation_h)?;
    let cols = window(w, k_w, o.stride_w, o.dilation_w)?;
    Ok(Shape::nhwc(n, rows.output, cols.output, out_c))
}

/// Reference `CONV_2D`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Conv2dKernel;

impl Kernel for Conv2dKernel {
    fn opcode(&self) -> OpCode {
        OpCode::Conv2d
    }

    fn prepare(&self, op: &OperatorDef, tensors: &[TensorDef]) -> Result<(), TensorError> {
        let input = check::input(op, tensors, 0)?;
        let filter = check::input(op, tensors, 1)?;
        let output = check::output(op, tensors)?;
        check::quantized(op, input)?;
        check::quantized(op, filter)?;
        check::quantized(op, output)?;

        let in_dims = check::nhwc(op, input)?;
        let [out_c, k_h, k_w, f_c] = check::nhwc(op, filter)?;
        if f_c != in_dims[3] {
            return Err(TensorError::ShapeMismatch {
                op: "conv2d",
                lhs: input.shape.clone(),
                rhs: filter.shape.clone(),
            });
        }
        if let Some(bias) = check::optional_input(op, tensors, 2) {
            check::bias(op, bias, out_c)?;
        }
        let expected = conv_output_shape(op, in_dims, k_h, k_w, out_c)?;
        check::shape(op, expected, &output.shape)
    }

    fn eval(&self, op: &OperatorDef, ctx: &mut EvalContext<'_>) -> Result<(), TensorError> {
        let (inputs, output) = ctx.io();
        conv2d(
            inputs.required(0)?,
            inputs.required(1)?,
            inputs.optional(2),
            &op.options.conv_params(),
            output,
        )
    }
}

/// Reference `DEPTHWISE_CONV_2D`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthwiseConv2dKernel;

impl Kernel for DepthwiseConv2dKernel {
    fn opcode(&self) -> OpCode {
        OpCode::DepthwiseConv2d
    }

    fn prepare(&self, op: &OperatorDef, tensors: &[TensorDef]) -> Result<(), TensorError> {
        let input = check::input(op, tensors, 0)?;
        let filter = check::input(op, tensors, 1)?;
        let output = check::output(op, tensors)?;
        check::quantized(op, input)?;
        check::quantized(op, filter)?;
        check::quantized(op, output)?;

        let in_dims = check::nhwc(op, input)?;
        let [one, k_h, k_w, f_c] = check::nhwc(op, filter)?;
        let mult = op.options.depth_multiplier;
        if one != 1 || mult == 0 || f_c != in_dims[3] * mult {
            return Err(TensorError::InvalidParameter {
                op: "depthwise_conv2d",
                detail: format!(
                    "filter {} incompatible with input {} and depth multiplier {mult}",
                    filter.shape, input.shape
                ),
            });
        }
        if let Some(bias) = check::optional_input(op, tensors, 2) {
            check::bias(op, bias, f_c)?;
        }
        let expected = conv_output_shape(op, in_dims, k_h, k_w, f_c)?;
        check::shape(op, expected, &output.shape)
    }

    fn eval(&self, op: &OperatorDef, ctx: &mut EvalContext<'_>) -> Result<(), TensorError> {
        let (inputs, output) = ctx.io();
        depthwise_conv2d(
            inputs.required(0)?,
            inputs.required(1)?,
            inputs.optional(2),
            &op.options.conv_params(),
            output,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::test_util::{i32_vec, op, q8};
    use model_ir::OpOptions;
    use tensor_core::Padding;

    #[test]
    fn test_conv_prepare_ok() {
        let tensors = vec![
            q8("in", vec![1, 8, 8, 1]),
            q8("w", vec![4, 3, 3, 1]),
            i32_vec("b", 4),
            q8("out", vec![1, 4, 4, 4]),
        ];
        let opts = OpOptions {
            stride_h: 2,
            stride_w: 2,
            ..OpOptions::default()
        };
        let o = op(OpCode::Conv2d, vec![Some(0), Some(1), Some(2)], 3, opts);
        Conv2dKernel.prepare(&o, &tensors).unwrap();
    }

    #[test]
    fn test_conv_prepare_wrong_output() {
        let tensors = vec![
            q8("in", vec![1, 8, 8, 1]),
            q8("w", vec![4, 3, 3, 1]),
            q8("out", vec![1, 8, 8, 4]),
        ];
        let opts = OpOptions {
            padding: Padding::Valid,
            ..OpOptions::default()
        };
        let o = op(OpCode::Conv2d, vec![Some(0), Some(1), None], 2, opts);
        assert!(matches!(
            Conv2dKernel.prepare(&o, &tensors),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_conv_prepare_missing_filter() {
        let tensors = vec![q8("in", vec![1, 8, 8, 1]), q8("out", vec![1, 8, 8, 1])];
        let o = op(OpCode::Conv2d, vec![Some(0)], 1, OpOptions::default());
        assert!(Conv2dKernel.prepare(&o, &tensors).is_err());
    }

    #[test]
    fn test_depthwise_prepare_multiplier() {
        let tensors = vec![
            q8("in", vec![1, 4, 4, 2]),
            q8("w", vec![1, 3, 3, 4]),
            q8("out", vec![1, 4, 4, 4]),
        ];
        let ok = op(
            OpCode::DepthwiseConv2d,
            vec![Some(0), Some(1), None],
            2,
            OpOptions {
                depth_multiplier: 2,
                ..OpOptions::default()
            },
        );
        DepthwiseConv2dKernel.prepare(&ok, &tensors).unwrap();

        let bad = op(
            OpCode::DepthwiseConv2d,
            vec![Some(0), Some(1), None],
            2,
            OpOptions::default(),
        );
        assert!(DepthwiseConv2dKernel.prepare(&bad, &tensors).is_err());
    }
}
