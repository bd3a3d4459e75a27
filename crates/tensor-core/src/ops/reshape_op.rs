// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reshape: reinterpret the same bytes under a new shape.

use crate::{TensorError, TensorView, TensorViewMut};

/// Copies `input` into `output` unchanged.
///
/// Element counts and dtypes must agree. Quantization is carried by the
/// tensor metadata, so the bytes need no conversion.
pub fn reshape(input: &TensorView<'_>, output: &mut TensorViewMut<'_>) -> Result<(), TensorError> {
    if input.shape().num_elements() != output.shape().num_elements() {
        return Err(TensorError::ShapeMismatch {
            op: "reshape",
            lhs: input.shape().clone(),
            rhs: output.shape().clone(),
        });
    }
    if input.dtype() != output.dtype() {
        return Err(TensorError::UnsupportedDType {
            op: "reshape",
            dtype: output.dtype(),
        });
    }
    output.as_bytes_mut().copy_from_slice(input.as_bytes());
    Ok(())
}
