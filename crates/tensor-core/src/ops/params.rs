// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shared operator parameters: padding, fused activations, window geometry.

use crate::{DType, QuantParams};

/// Spatial padding mode, with TensorFlow semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Padding {
    /// Output keeps `ceil(input / stride)` positions, zero-padded evenly.
    #[default]
    Same,
    /// No padding; only full windows are produced.
    Valid,
}

/// Activation fused into the preceding operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    None,
    Relu,
    Relu6,
}

impl Activation {
    /// Quantized output range after applying this activation.
    pub fn quantized_range(self, dtype: DType, q: &QuantParams) -> (i32, i32) {
        let (lo, hi) = dtype.quantized_range().unwrap_or((i32::MIN, i32::MAX));
        match self {
            Activation::None => (lo, hi),
            Activation::Relu => (lo.max(q.zero_point), hi),
            Activation::Relu6 => {
                // A tiny scale puts six far past the dtype range.
                let six = (q.zero_point as f64 + (6.0 / q.scale as f64).round())
                    .clamp(lo as f64, hi as f64) as i32;
                (lo.max(q.zero_point), hi.min(six))
            }
        }
    }
}

/// Geometry of a sliding window along one spatial axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDim {
    /// Number of output positions.
    pub output: usize,
    /// Zero padding inserted before the first input element.
    pub pad_before: usize,
}

/// Computes output extent and leading pad for one spatial axis.
///
/// Returns `None` if the (dilated) filter does not fit a `Valid` window
/// or if `stride`/`dilation` is zero.
pub fn compute_padding(
    input: usize,
    filter: usize,
    stride: usize,
    dilation: usize,
    padding: Padding,
) -> Option<WindowDim> {
    if stride == 0 || dilation == 0 || filter == 0 {
        return None;
    }
    let effective = (filter - 1) * dilation + 1;
    let output = match padding {
        Padding::Same => input.div_ceil(stride),
        Padding::Valid => {
            if effective > input {
                return None;
            }
            (input - effective) / stride + 1
        }
    };
    let needed = ((output.saturating_sub(1)) * stride + effective).saturating_sub(input);
    let pad_before = match padding {
        Padding::Same => needed / 2,
        Padding::Valid => 0,
    };
    Some(WindowDim { output, pad_before })
}

/// Parameters for 2-D convolutions (regular and depthwise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvParams {
    pub stride_h: usize,
    pub stride_w: usize,
    pub dilation_h: usize,
    pub dilation_w: usize,
    pub padding: Padding,
    pub activation: Activation,
    /// Output channels per input channel (depthwise only).
    pub depth_multiplier: usize,
}

impl Default for ConvParams {
    fn default() -> Self {
        Self {
            stride_h: 1,
            stride_w: 1,
            dilation_h: 1,
            dilation_w: 1,
            padding: Padding::Same,
            activation: Activation::None,
            depth_multiplier: 1,
        }
    }
}

/// Parameters for average and max pooling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolParams {
    pub filter_h: usize,
    pub filter_w: usize,
    pub stride_h: usize,
    pub stride_w: usize,
    pub padding: Padding,
    pub activation: Activation,
}
