// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A small deterministic classifier for demos and tests.
//!
//! ```text
//! input [1,H,W,C]
//!   → conv2d 3x3/2 (4, relu) → depthwise 3x3 (relu)
//!   → max_pool 2x2/2 → average_pool 2x2/2
//!   → reshape [1, N] → fully_connected (classes) → softmax
//! ```
//!
//! Weights come from a fixed linear congruential generator, so every build
//! carries the same constants. The model is untrained; its outputs are only
//! meaningful as a smoke test.

use crate::{ImageSpec, PipelineError};
use model_ir::{ModelBuilder, OpCode, OpOptions};
use tensor_core::{Activation, DType, QuantParams, Shape, Tensor};

const FEATURES: usize = 4;

struct Lcg(u32);

impl Lcg {
    fn next_i8(&mut self) -> i8 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        ((self.0 >> 24) as i8) / 2
    }

    fn i8_vec(&mut self, n: usize) -> Vec<i8> {
        (0..n).map(|_| self.next_i8()).collect()
    }

    fn bias_vec(&mut self, n: usize) -> Vec<i32> {
        (0..n).map(|_| i32::from(self.next_i8()) * 16).collect()
    }
}

/// Builds the demo classifier with a `U8` input.
pub fn classifier_model(spec: &ImageSpec, classes: usize) -> Result<Vec<u8>, PipelineError> {
    classifier_model_with_input(spec, classes, DType::U8)
}

/// Builds the demo classifier with a `U8` or `I8` input.
pub fn classifier_model_with_input(
    spec: &ImageSpec,
    classes: usize,
    input_dtype: DType,
) -> Result<Vec<u8>, PipelineError> {
    let input_q = match input_dtype {
        DType::U8 => QuantParams::new(1.0 / 255.0, 0),
        DType::I8 => QuantParams::new(1.0 / 255.0, -128),
        other => {
            return Err(PipelineError::Config(format!(
                "demo model input must be u8 or i8, got {other}"
            )))
        }
    };
    if classes == 0 || spec.byte_len() == 0 {
        return Err(PipelineError::Config("demo model needs classes and pixels".into()));
    }

    let mut rng = Lcg(0x5EED);
    let weight_q = QuantParams::new(0.02, 0);
    let act_q = QuantParams::new(0.03, -128);

    let (h1, w1) = (spec.height.div_ceil(2), spec.width.div_ceil(2));
    let (h2, w2) = (h1.div_ceil(2), w1.div_ceil(2));
    let (h3, w3) = (h2.div_ceil(2), w2.div_ceil(2));
    let flat = h3 * w3 * FEATURES;

    let mut b = ModelBuilder::new("demo_classifier").description(format!(
        "{}x{}x{} -> {classes} classes, deterministic weights",
        spec.width, spec.height, spec.channels
    ));

    let t_in = b.add_tensor("input", spec.input_shape(), input_dtype, Some(input_q));

    let conv_w = Tensor::from_i8(
        Shape::nhwc(FEATURES, 3, 3, spec.channels),
        &rng.i8_vec(FEATURES * 9 * spec.channels),
    )?
    .with_quant(weight_q);
    let t_conv_w = b.add_constant_tensor("conv/filter", &conv_w)?;
    let t_conv_b = b.add_constant_tensor(
        "conv/bias",
        &Tensor::from_i32(Shape::vector(FEATURES), &rng.bias_vec(FEATURES))?,
    )?;
    let t_conv = b.add_tensor("conv/out", Shape::nhwc(1, h1, w1, FEATURES), DType::I8, Some(act_q));

    let dw_w = Tensor::from_i8(Shape::nhwc(1, 3, 3, FEATURES), &rng.i8_vec(9 * FEATURES))?
        .with_quant(weight_q);
    let t_dw_w = b.add_constant_tensor("dw/filter", &dw_w)?;
    let t_dw = b.add_tensor("dw/out", Shape::nhwc(1, h1, w1, FEATURES), DType::I8, Some(act_q));

    let t_max = b.add_tensor("pool/max", Shape::nhwc(1, h2, w2, FEATURES), DType::I8, Some(act_q));
    let t_avg = b.add_tensor("pool/avg", Shape::nhwc(1, h3, w3, FEATURES), DType::I8, Some(act_q));
    let t_flat = b.add_tensor("flatten", Shape::matrix(1, flat), DType::I8, Some(act_q));

    let fc_w = Tensor::from_i8(Shape::matrix(classes, flat), &rng.i8_vec(classes * flat))?
        .with_quant(QuantParams::new(0.01, 0));
    let t_fc_w = b.add_constant_tensor("fc/weights", &fc_w)?;
    let t_fc_b = b.add_constant_tensor(
        "fc/bias",
        &Tensor::from_i32(Shape::vector(classes), &rng.bias_vec(classes))?,
    )?;
    let t_logits = b.add_tensor(
        "logits",
        Shape::matrix(1, classes),
        DType::I8,
        Some(QuantParams::new(0.1, 0)),
    );
    let t_probs = b.add_tensor(
        "probs",
        Shape::matrix(1, classes),
        DType::I8,
        Some(QuantParams::new(1.0 / 256.0, -128)),
    );

    let pool2 = OpOptions {
        filter_h: 2,
        filter_w: 2,
        stride_h: 2,
        stride_w: 2,
        ..OpOptions::default()
    };
    b.add_operator(
        OpCode::Conv2d,
        vec![Some(t_in), Some(t_conv_w), Some(t_conv_b)],
        t_conv,
        OpOptions {
            stride_h: 2,
            stride_w: 2,
            activation: Activation::Relu,
            ..OpOptions::default()
        },
    )
    .add_operator(
        OpCode::DepthwiseConv2d,
        vec![Some(t_conv), Some(t_dw_w), None],
        t_dw,
        OpOptions {
            activation: Activation::Relu,
            ..OpOptions::default()
        },
    )
    .add_operator(OpCode::MaxPool2d, vec![Some(t_dw)], t_max, pool2.clone())
    .add_operator(OpCode::AveragePool2d, vec![Some(t_max)], t_avg, pool2)
    .add_operator(
        OpCode::Reshape,
        vec![Some(t_avg)],
        t_flat,
        OpOptions {
            new_shape: Some(vec![1, flat]),
            ..OpOptions::default()
        },
    )
    .add_operator(
        OpCode::FullyConnected,
        vec![Some(t_flat), Some(t_fc_w), Some(t_fc_b)],
        t_logits,
        OpOptions::default(),
    )
    .add_operator(OpCode::Softmax, vec![Some(t_logits)], t_probs, OpOptions::default())
    .set_inputs(vec![t_in])
    .set_outputs(vec![t_probs]);

    Ok(b.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::Model;

    #[test]
    fn test_demo_model_loads_and_uses_every_op() {
        let blob = classifier_model(&ImageSpec::default(), 10).unwrap();
        let model = Model::from_vec(blob).unwrap();
        let graph = model.graph();
        let mut opcodes: Vec<OpCode> = graph.iter_operators().map(|op| op.opcode).collect();
        opcodes.sort_by_key(|op| OpCode::ALL.iter().position(|o| o == op));
        assert_eq!(opcodes, OpCode::ALL.to_vec());
        assert_eq!(graph.tensors[graph.inputs[0]].shape, Shape::nhwc(1, 64, 64, 1));
    }

    #[test]
    fn test_demo_model_is_deterministic() {
        let spec = ImageSpec::new(28, 28, 1);
        let a = Model::from_vec(classifier_model(&spec, 3).unwrap()).unwrap();
        let b = Model::from_vec(classifier_model(&spec, 3).unwrap()).unwrap();
        for (t, def) in a.graph().tensors.iter().enumerate() {
            if def.constant {
                assert_eq!(a.constant_data(t), b.constant_data(t), "{}", def.name);
            }
        }
    }

    #[test]
    fn test_demo_model_rejects_f32_input() {
        assert!(classifier_model_with_input(&ImageSpec::default(), 2, DType::F32).is_err());
    }
}
