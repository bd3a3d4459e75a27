// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Affine quantization: `real = scale * (q - zero_point)`.

use crate::DType;

/// Per-tensor affine quantization parameters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuantParams {
    /// Real-valued step between adjacent quantized levels.
    pub scale: f32,
    /// Quantized value that represents real zero.
    pub zero_point: i32,
}

impl QuantParams {
    pub fn new(scale: f32, zero_point: i32) -> Self {
        Self { scale, zero_point }
    }

    /// Quantizes `value` to `dtype`, rounding to nearest and saturating.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{DType, QuantParams};
    /// let q = QuantParams::new(0.5, 10);
    /// assert_eq!(q.quantize(2.0, DType::U8), 14);
    /// assert_eq!(q.quantize(1000.0, DType::U8), 255);
    /// ```
    pub fn quantize(&self, value: f32, dtype: DType) -> i32 {
        let (lo, hi) = dtype.quantized_range().unwrap_or((i32::MIN, i32::MAX));
        let q = (value / self.scale).round() as i64 + self.zero_point as i64;
        q.clamp(lo as i64, hi as i64) as i32
    }

    /// Maps a quantized value back to its real value.
    pub fn dequantize(&self, q: i32) -> f32 {
        (q - self.zero_point) as f32 * self.scale
    }

    /// Returns `true` if the scale is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0
    }
}

/// Scales an `i32` accumulator into the output domain and clamps it.
///
/// `multiplier` is `input_scale * filter_scale / output_scale`. Rounding is
/// half away from zero.
#[inline]
pub fn requantize(acc: i32, multiplier: f64, zero_point: i32, range: (i32, i32)) -> i32 {
    let scaled = (acc as f64 * multiplier).round() as i64 + zero_point as i64;
    scaled.clamp(range.0 as i64, range.1 as i64) as i32
}
