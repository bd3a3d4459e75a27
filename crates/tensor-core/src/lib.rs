// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Quantized tensor types and reference kernels for micro-inference workloads.
//!
//! This crate provides:
//! - [`Tensor`]: an owned n-dimensional byte buffer with optional quantization.
//! - [`TensorView`] / [`TensorViewMut`]: zero-copy views used by kernels.
//! - [`Shape`]: runtime shape descriptors with NHWC helpers.
//! - [`DType`]: supported element data types (u8, i8, i32, f32).
//! - [`QuantParams`]: per-tensor affine quantization.
//! - Kernels: convolution, depthwise convolution, fully connected, pooling,
//!   softmax and reshape.
//!
//! # Design Goals
//! - Kernels write into caller-provided buffers; nothing allocates per element.
//! - All activation math is integer, with a single float rescale per output.
//! - Clean error types via `thiserror`.

mod dtype;
mod error;
pub mod ops;
mod quant;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use ops::{
    average_pool2d, compute_padding, conv2d, depthwise_conv2d, fully_connected, max_pool2d,
    reshape, softmax, Activation, ConvParams, Padding, PoolParams,
};
pub use quant::{requantize, QuantParams};
pub use shape::Shape;
pub use tensor::{Tensor, TensorView, TensorViewMut};
