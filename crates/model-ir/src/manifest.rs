// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON model manifest.
//!
//! The manifest is stored in the blob's `__metadata__` under `graph` and
//! describes the tensor table and the operator list.
//!
//! # Format
//! ```json
//! {
//!   "name": "digits",
//!   "tensors": [
//!     { "name": "image", "shape": [1, 64, 64, 1], "dtype": "u8",
//!       "quantization": { "scale": 0.0039, "zero_point": 0 } },
//!     { "name": "conv0.weight", "shape": [8, 3, 3, 1], "dtype": "i8",
//!       "quantization": { "scale": 0.02, "zero_point": 0 }, "constant": true },
//!     ...
//!   ],
//!   "operators": [
//!     { "opcode": "conv2d", "inputs": [0, 1, null], "outputs": [3],
//!       "options": { "stride_h": 2, "stride_w": 2, "activation": "relu" } },
//!     ...
//!   ],
//!   "inputs": [0],
//!   "outputs": [9]
//! }
//! ```

use crate::{ModelError, OperatorDef};
use tensor_core::{DType, QuantParams, Shape};

/// Top-level model manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelManifest {
    /// Human-readable model name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tensors: Vec<TensorDef>,
    /// Operators in execution order.
    pub operators: Vec<OperatorDef>,
    /// Graph input tensor indices.
    pub inputs: Vec<usize>,
    /// Graph output tensor indices.
    pub outputs: Vec<usize>,
}

/// One entry of the tensor table.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TensorDef {
    pub name: String,
    pub shape: Shape,
    pub dtype: DType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<QuantParams>,
    /// Constant tensors have their bytes in the container under `name`.
    #[serde(default)]
    pub constant: bool,
}

impl TensorDef {
    /// Size of the tensor's data in bytes.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes(self.dtype)
    }
}

impl ModelManifest {
    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Serializes the manifest to compact JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Total bytes held by constant tensors.
    pub fn constant_bytes(&self) -> usize {
        self.tensors
            .iter()
            .filter(|t| t.constant)
            .map(TensorDef::size_bytes)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OpCode;

    fn sample_manifest_json() -> &'static str {
        r#"{
            "name": "tiny",
            "tensors": [
                { "name": "in", "shape": [1, 4], "dtype": "u8",
                  "quantization": { "scale": 0.5, "zero_point": 0 } },
                { "name": "w", "shape": [2, 4], "dtype": "u8",
                  "quantization": { "scale": 0.5, "zero_point": 0 }, "constant": true },
                { "name": "out", "shape": [1, 2], "dtype": "u8",
                  "quantization": { "scale": 1.0, "zero_point": 0 } }
            ],
            "operators": [
                { "opcode": "fully_connected", "inputs": [0, 1, null], "outputs": [2] }
            ],
            "inputs": [0],
            "outputs": [2]
        }"#
    }

    #[test]
    fn test_parse_manifest() {
        let m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        assert_eq!(m.name, "tiny");
        assert!(m.description.is_none());
        assert_eq!(m.tensors.len(), 3);
        assert_eq!(m.tensors[0].shape, Shape::matrix(1, 4));
        assert!(m.tensors[1].constant);
        assert!(!m.tensors[2].constant);
        assert_eq!(m.operators[0].opcode, OpCode::FullyConnected);
    }

    #[test]
    fn test_constant_bytes() {
        let m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        assert_eq!(m.constant_bytes(), 8);
    }

    #[test]
    fn test_serde_roundtrip() {
        let m = ModelManifest::from_json(sample_manifest_json()).unwrap();
        let json = m.to_json().unwrap();
        assert!(json.contains("\"shape\":[1,4]"));
        let back = ModelManifest::from_json(&json).unwrap();
        assert_eq!(back.tensors.len(), m.tensors.len());
        assert_eq!(back.operators[0].inputs, vec![Some(0), Some(1), None]);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ModelManifest::from_json("{ not json"),
            Err(ModelError::ManifestParseError(_))
        ));
    }
}
