// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type and view abstractions.

use crate::{DType, QuantParams, Shape, TensorError};

/// An owned, n-dimensional tensor stored in contiguous memory.
///
/// Inside the interpreter tensors live in the arena and are only ever seen
/// through [`TensorView`] / [`TensorViewMut`]. `Tensor` is the owned form
/// used for constants, tests and benchmarks.
///
/// # Memory Layout
/// Data is stored in row-major (C) order as a flat little-endian byte buffer.
#[derive(Debug, Clone)]
pub struct Tensor {
    shape: Shape,
    dtype: DType,
    quant: Option<QuantParams>,
    data: Vec<u8>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape, DType};
    /// let t = Tensor::zeros(Shape::matrix(2, 3), DType::I32);
    /// assert_eq!(t.size_bytes(), 24); // 2 * 3 * 4 bytes
    /// ```
    pub fn zeros(shape: Shape, dtype: DType) -> Self {
        let size = shape.size_bytes(dtype);
        Self {
            shape,
            dtype,
            quant: None,
            data: vec![0u8; size],
        }
    }

    /// Creates a tensor from raw bytes.
    ///
    /// Returns an error if the buffer size does not match `shape.size_bytes(dtype)`.
    pub fn from_bytes(shape: Shape, dtype: DType, data: Vec<u8>) -> Result<Self, TensorError> {
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            shape,
            dtype,
            quant: None,
            data,
        })
    }

    /// Creates a `U8` tensor.
    pub fn from_u8(shape: Shape, values: &[u8]) -> Result<Self, TensorError> {
        Self::from_bytes(shape, DType::U8, values.to_vec())
    }

    /// Creates an `I8` tensor.
    pub fn from_i8(shape: Shape, values: &[i8]) -> Result<Self, TensorError> {
        Self::from_bytes(shape, DType::I8, values.iter().map(|&v| v as u8).collect())
    }

    /// Creates an `I32` tensor (little-endian).
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_i32(Shape::vector(2), &[1, -1]).unwrap();
    /// assert_eq!(t.to_i32_vec(), vec![1, -1]);
    /// ```
    pub fn from_i32(shape: Shape, values: &[i32]) -> Result<Self, TensorError> {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::from_bytes(shape, DType::I32, data)
    }

    /// Attaches quantization parameters.
    pub fn with_quant(mut self, quant: QuantParams) -> Self {
        self.quant = Some(quant);
        self
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the quantization parameters, if any.
    pub fn quant(&self) -> Option<QuantParams> {
        self.quant
    }

    /// Returns an immutable view over this tensor's data.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            shape: &self.shape,
            dtype: self.dtype,
            quant: self.quant,
            data: &self.data,
        }
    }

    /// Returns a mutable view over this tensor's data.
    pub fn view_mut(&mut self) -> TensorViewMut<'_> {
        TensorViewMut {
            shape: &self.shape,
            dtype: self.dtype,
            quant: self.quant,
            data: &mut self.data,
        }
    }

    /// Returns the raw byte slice backing this tensor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the memory footprint of this tensor in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Decodes every element as `i32` (integer dtypes only).
    pub fn to_i32_vec(&self) -> Vec<i32> {
        self.view().to_i32_vec()
    }
}

/// A borrowed, read-only view over tensor data.
///
/// Views are zero-copy and tied to the lifetime of the backing buffer,
/// which is either an owned [`Tensor`], the model blob or the arena.
#[derive(Debug, Clone, Copy)]
pub struct TensorView<'a> {
    shape: &'a Shape,
    dtype: DType,
    quant: Option<QuantParams>,
    data: &'a [u8],
}

impl<'a> TensorView<'a> {
    /// Creates a view from raw parts, checking the byte length.
    pub fn new(
        shape: &'a Shape,
        dtype: DType,
        quant: Option<QuantParams>,
        data: &'a [u8],
    ) -> Result<Self, TensorError> {
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            shape,
            dtype,
            quant,
            data,
        })
    }

    /// Returns the shape of the viewed tensor.
    pub fn shape(&self) -> &'a Shape {
        self.shape
    }

    /// Returns the data type of the viewed tensor.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the quantization parameters, if any.
    pub fn quant(&self) -> Option<QuantParams> {
        self.quant
    }

    /// Returns the raw byte slice.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Number of elements in the view.
    pub fn len(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns `true` if the view holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads element `index` as `i32`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn get_i32(&self, index: usize) -> i32 {
        crate::dtype::load_i32(self.dtype, self.data, index)
    }

    /// Decodes every element as `i32`.
    pub fn to_i32_vec(&self) -> Vec<i32> {
        (0..self.len()).map(|i| self.get_i32(i)).collect()
    }

    /// Dequantizes element `index` to its real value.
    ///
    /// Returns `None` when the view carries no quantization parameters.
    pub fn dequantize(&self, index: usize) -> Option<f32> {
        self.quant.map(|q| q.dequantize(self.get_i32(index)))
    }
}

/// A borrowed, writable view over tensor data.
#[derive(Debug)]
pub struct TensorViewMut<'a> {
    shape: &'a Shape,
    dtype: DType,
    quant: Option<QuantParams>,
    data: &'a mut [u8],
}

impl<'a> TensorViewMut<'a> {
    /// Creates a mutable view from raw parts, checking the byte length.
    pub fn new(
        shape: &'a Shape,
        dtype: DType,
        quant: Option<QuantParams>,
        data: &'a mut [u8],
    ) -> Result<Self, TensorError> {
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            shape,
            dtype,
            quant,
            data,
        })
    }

    pub fn shape(&self) -> &'a Shape {
        self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn quant(&self) -> Option<QuantParams> {
        self.quant
    }

    pub fn as_bytes(&self) -> &[u8] {
        &*self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.data
    }

    /// Writes a quantized value (already clamped) into element `index`.
    pub fn set_i32(&mut self, index: usize, value: i32) {
        crate::dtype::store_quantized(self.dtype, self.data, index, value);
    }

    /// Reborrows as a read-only view.
    pub fn as_view(&self) -> TensorView<'_> {
        TensorView {
            shape: self.shape,
            dtype: self.dtype,
            quant: self.quant,
            data: &*self.data,
        }
    }
}
