// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator definitions for the model IR.
//!
//! An [`OperatorDef`] names the computation ([`OpCode`]), the tensors it
//! reads and writes (indices into the graph's tensor table) and its
//! [`OpOptions`]. Tensor data is **not** stored here.

use tensor_core::{Activation, ConvParams, Padding, PoolParams};

/// The kind of computation an operator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpCode {
    /// 2-D convolution over NHWC input.
    Conv2d,
    /// Per-channel 2-D convolution.
    DepthwiseConv2d,
    /// Dense layer.
    FullyConnected,
    AveragePool2d,
    MaxPool2d,
    Softmax,
    /// Shape change without data movement.
    Reshape,
}

impl OpCode {
    /// Every opcode, in declaration order.
    pub const ALL: [OpCode; 7] = [
        OpCode::Conv2d,
        OpCode::DepthwiseConv2d,
        OpCode::FullyConnected,
        OpCode::AveragePool2d,
        OpCode::MaxPool2d,
        OpCode::Softmax,
        OpCode::Reshape,
    ];

    /// Parses an opcode, accepting both snake_case (`"depthwise_conv2d"`)
    /// and the builtin-operator spellings (`"DEPTHWISE_CONV_2D"`).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "conv2d" | "conv_2d" | "conv" => Some(Self::Conv2d),
            "depthwise_conv2d" | "depthwise_conv_2d" | "dwconv" => Some(Self::DepthwiseConv2d),
            "fully_connected" | "dense" | "fc" => Some(Self::FullyConnected),
            "average_pool2d" | "average_pool_2d" | "avg_pool" => Some(Self::AveragePool2d),
            "max_pool2d" | "max_pool_2d" | "max_pool" => Some(Self::MaxPool2d),
            "softmax" => Some(Self::Softmax),
            "reshape" => Some(Self::Reshape),
            _ => None,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conv2d => "conv2d",
            Self::DepthwiseConv2d => "depthwise_conv2d",
            Self::FullyConnected => "fully_connected",
            Self::AveragePool2d => "average_pool2d",
            Self::MaxPool2d => "max_pool2d",
            Self::Softmax => "softmax",
            Self::Reshape => "reshape",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builtin options for an operator. Fields an opcode does not use are ignored.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OpOptions {
    pub padding: Padding,
    pub stride_h: usize,
    pub stride_w: usize,
    pub dilation_h: usize,
    pub dilation_w: usize,
    /// Pooling window.
    pub filter_h: usize,
    pub filter_w: usize,
    pub depth_multiplier: usize,
    /// Fused activation applied to the output.
    pub activation: Activation,
    /// Softmax temperature.
    pub beta: f32,
    /// Reshape target; the output tensor's shape is authoritative.
    pub new_shape: Option<Vec<usize>>,
}

impl Default for OpOptions {
    fn default() -> Self {
        Self {
            padding: Padding::Same,
            stride_h: 1,
            stride_w: 1,
            dilation_h: 1,
            dilation_w: 1,
            filter_h: 1,
            filter_w: 1,
            depth_multiplier: 1,
            activation: Activation::None,
            beta: 1.0,
            new_shape: None,
        }
    }
}

impl OpOptions {
    /// Convolution parameters derived from these options.
    pub fn conv_params(&self) -> ConvParams {
        ConvParams {
            stride_h: self.stride_h,
            stride_w: self.stride_w,
            dilation_h: self.dilation_h,
            dilation_w: self.dilation_w,
            padding: self.padding,
            activation: self.activation,
            depth_multiplier: self.depth_multiplier,
        }
    }

    /// Pooling parameters derived from these options.
    pub fn pool_params(&self) -> PoolParams {
        PoolParams {
            filter_h: self.filter_h,
            filter_w: self.filter_w,
            stride_h: self.stride_h,
            stride_w: self.stride_w,
            padding: self.padding,
            activation: self.activation,
        }
    }
}

/// A single operator in the graph.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OperatorDef {
    pub opcode: OpCode,
    /// Tensor indices; `None` marks an absent optional operand (e.g. bias).
    pub inputs: Vec<Option<usize>>,
    /// Tensor indices written by this operator.
    pub outputs: Vec<usize>,
    #[serde(default)]
    pub options: OpOptions,
}

impl OperatorDef {
    /// Input tensor `slot`, if present.
    pub fn input(&self, slot: usize) -> Option<usize> {
        self.inputs.get(slot).copied().flatten()
    }

    /// The single output tensor.
    ///
    /// # Panics
    /// Panics on an operator with no outputs; validated graphs always have one.
    pub fn output(&self) -> usize {
        self.outputs[0]
    }

    /// Iterates the present input tensor indices.
    pub fn present_inputs(&self) -> impl Iterator<Item = usize> + '_ {
        self.inputs.iter().filter_map(|i| *i)
    }

    /// Returns a one-line summary of this operator.
    pub fn summary(&self) -> String {
        let inputs: Vec<String> = self
            .inputs
            .iter()
            .map(|i| i.map_or_else(|| "-".to_string(), |i| i.to_string()))
            .collect();
        format!(
            "{} ({}) -> {:?}",
            self.opcode,
            inputs.join(", "),
            self.outputs
        )
    }
}
