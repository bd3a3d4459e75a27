// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reference kernels for the builtin operators.
//!
//! Each kernel is a zero-sized type implementing [`crate::Kernel`] on top
//! of the matching `tensor_core` operation.

mod conv;
mod fully_connected;
mod pooling;
mod reshape;
mod softmax;

pub use conv::{Conv2dKernel, DepthwiseConv2dKernel};
pub use fully_connected::FullyConnectedKernel;
pub use pooling::{AveragePool2dKernel, MaxPool2dKernel};
pub use reshape::ReshapeKernel;
pub use softmax::SoftmaxKernel;
