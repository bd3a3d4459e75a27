// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the image pipeline.

/// Errors that can occur while booting or processing images.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Configuration could not be read or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] flash_storage::StorageError),

    #[error("model error: {0}")]
    Model(#[from] model_ir::ModelError),

    #[error("tensor error: {0}")]
    Tensor(#[from] tensor_core::TensorError),

    #[error("arena error: {0}")]
    Arena(#[from] tensor_arena::ArenaError),

    #[error("interpreter error: {0}")]
    Interpreter(#[from] interpreter::InterpreterError),

    /// The model's input or output does not fit the configured images.
    #[error("model does not match image spec: {0}")]
    ModelMismatch(String),

    /// A raw image is not exactly `width × height × channels` bytes.
    #[error("{path}: read {actual} bytes instead of {expected}")]
    ImageSize {
        path: String,
        expected: usize,
        actual: usize,
    },

    /// An encoded image has the wrong pixel dimensions.
    #[error("{path}: image is {found_w}x{found_h}, expected {expected_w}x{expected_h}")]
    ImageDimensions {
        path: String,
        expected_w: u32,
        expected_h: u32,
        found_w: u32,
        found_h: u32,
    },

    /// The file extension names no known image source.
    #[error("{path}: unsupported image format")]
    UnsupportedFormat { path: String },

    /// Only grayscale (1) and RGB (3) images are supported.
    #[error("unsupported channel count {0}; expected 1 or 3")]
    UnsupportedChannels(usize),

    #[error("{path}: failed to decode image: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
