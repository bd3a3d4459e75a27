// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model loading and IR construction.

/// Errors that can occur when working with model blobs.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The model file could not be opened or mapped.
    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),

    /// The embedded graph JSON is malformed.
    #[error("failed to parse model graph: {0}")]
    ManifestParseError(#[from] serde_json::Error),

    /// The SafeTensors container is malformed.
    #[error("failed to load SafeTensors container: {0}")]
    SafeTensorsError(String),

    /// A required `__metadata__` key is absent.
    #[error("model metadata is missing '{key}'")]
    MissingMetadata { key: &'static str },

    /// The blob was not produced for this runtime.
    #[error("unrecognised model format '{found}'")]
    UnknownFormat { found: String },

    /// The blob's schema version differs from the one this runtime reads.
    #[error("model provided is schema version {found} not equal to supported version {expected}")]
    SchemaVersionMismatch { expected: u32, found: u32 },

    /// The schema version string is not an integer.
    #[error("invalid schema version '{0}'")]
    InvalidSchemaVersion(String),

    /// A constant tensor referenced by the graph was not found in the container.
    #[error("constant tensor not found: {name}")]
    ConstantNotFound { name: String },

    /// A tensor definition is invalid (e.g., zero elements, missing quantization).
    #[error("invalid tensor '{tensor}': {detail}")]
    InvalidTensor { tensor: String, detail: String },

    /// An operator definition is invalid.
    #[error("invalid operator #{index} ({opcode}): {detail}")]
    InvalidOperator {
        index: usize,
        opcode: crate::OpCode,
        detail: String,
    },

    /// The model graph is otherwise malformed.
    #[error("invalid model graph: {0}")]
    InvalidGraph(String),
}

impl From<safetensors::SafeTensorError> for ModelError {
    fn from(e: safetensors::SafeTensorError) -> Self {
        ModelError::SafeTensorsError(e.to_string())
    }
}
