// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Supported tensor element data types.

/// Enumerates the element types a [`crate::Tensor`] can hold.
///
/// Activations in a quantized model are `U8` or `I8`. Biases are `I32`.
/// `F32` exists so float tensors can be described and inspected, but no
/// kernel computes on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 8-bit unsigned integer (asymmetric quantization).
    U8,
    /// 8-bit signed integer (asymmetric quantization).
    I8,
    /// 32-bit signed integer, used for biases.
    I32,
    /// 32-bit IEEE 754 floating point.
    F32,
}

impl DType {
    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            DType::U8 | DType::I8 => 1,
            DType::I32 | DType::F32 => 4,
        }
    }

    /// Returns a human-readable label for this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::U8 => "u8",
            DType::I8 => "i8",
            DType::I32 => "i32",
            DType::F32 => "f32",
        }
    }

    /// Parses a dtype label, accepting common aliases.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "u8" | "uint8" => Some(DType::U8),
            "i8" | "int8" => Some(DType::I8),
            "i32" | "int32" => Some(DType::I32),
            "f32" | "float32" => Some(DType::F32),
            _ => None,
        }
    }

    /// Inclusive integer range for quantized activation types.
    pub fn quantized_range(self) -> Option<(i32, i32)> {
        match self {
            DType::U8 => Some((0, 255)),
            DType::I8 => Some((-128, 127)),
            _ => None,
        }
    }

    /// Returns `true` for `U8` and `I8`.
    pub fn is_quantized(self) -> bool {
        self.quantized_range().is_some()
    }
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads element `index` of a `U8`, `I8` or `I32` buffer as `i32`.
#[inline]
pub(crate) fn load_i32(dtype: DType, data: &[u8], index: usize) -> i32 {
    match dtype {
        DType::U8 => data[index] as i32,
        DType::I8 => data[index] as i8 as i32,
        DType::I32 => {
            let o = index * 4;
            i32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]])
        }
        DType::F32 => {
            let o = index * 4;
            f32::from_le_bytes([data[o], data[o + 1], data[o + 2], data[o + 3]]) as i32
        }
    }
}

/// Writes an already-clamped quantized value into element `index`.
#[inline]
pub(crate) fn store_quantized(dtype: DType, data: &mut [u8], index: usize, value: i32) {
    match dtype {
        DType::U8 => data[index] = value as u8,
        DType::I8 => data[index] = value as i8 as u8,
        DType::I32 => data[index * 4..index * 4 + 4].copy_from_slice(&value.to_le_bytes()),
        DType::F32 => {
            data[index * 4..index * 4 + 4].copy_from_slice(&(value as f32).to_le_bytes())
        }
    }
}
