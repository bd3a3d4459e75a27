// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Registry mapping opcodes to kernels.

use crate::kernels::{
    AveragePool2dKernel, Conv2dKernel, DepthwiseConv2dKernel, FullyConnectedKernel,
    MaxPool2dKernel, ReshapeKernel, SoftmaxKernel,
};
use crate::{InterpreterError, Kernel};
use model_ir::OpCode;

/// A fixed-capacity set of kernels, at most one per opcode.
///
/// ```
/// use interpreter::OpResolver;
/// let mut resolver = OpResolver::with_capacity(2);
/// resolver.add_conv2d().unwrap().add_softmax().unwrap();
/// assert!(resolver.add_reshape().is_err());
/// ```
pub struct OpResolver {
    kernels: Vec<Box<dyn Kernel>>,
    capacity: usize,
}

impl OpResolver {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            kernels: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// A resolver holding the reference kernel for every builtin opcode.
    pub fn with_builtins() -> Self {
        let mut resolver = Self::with_capacity(OpCode::ALL.len());
        for kernel in builtin_kernels() {
            resolver.kernels.push(kernel);
        }
        resolver
    }

    /// Registers `kernel`, failing if the resolver is full or its opcode is
    /// already taken.
    pub fn add(&mut self, kernel: Box<dyn Kernel>) -> Result<&mut Self, InterpreterError> {
        let opcode = kernel.opcode();
        if self.index_of(opcode).is_some() {
            return Err(InterpreterError::DuplicateOp { opcode });
        }
        if self.kernels.len() >= self.capacity {
            return Err(InterpreterError::ResolverFull {
                capacity: self.capacity,
            });
        }
        tracing::debug!(%opcode, kernel = kernel.name(), "registered kernel");
        self.kernels.push(kernel);
        Ok(self)
    }

    pub fn add_conv2d(&mut self) -> Result<&mut Self, InterpreterError> {
        self.add(Box::new(Conv2dKernel))
    }

    pub fn add_depthwise_conv2d(&mut self) -> Result<&mut Self, InterpreterError> {
        self.add(Box::new(DepthwiseConv2dKernel))
    }

    pub fn add_fully_connected(&mut self) -> Result<&mut Self, InterpreterError> {
        self.add(Box::new(FullyConnectedKernel))
    }

    pub fn add_average_pool2d(&mut self) -> Result<&mut Self, InterpreterError> {
        self.add(Box::new(AveragePool2dKernel))
    }

    pub fn add_max_pool2d(&mut self) -> Result<&mut Self, InterpreterError> {
        self.add(Box::new(MaxPool2dKernel))
    }

    pub fn add_softmax(&mut self) -> Result<&mut Self, InterpreterError> {
        self.add(Box::new(SoftmaxKernel))
    }

    pub fn add_reshape(&mut self) -> Result<&mut Self, InterpreterError> {
        self.add(Box::new(ReshapeKernel))
    }

    /// Position of the kernel registered for `opcode`.
    pub fn index_of(&self, opcode: OpCode) -> Option<usize> {
        self.kernels.iter().position(|k| k.opcode() == opcode)
    }

    pub fn find(&self, opcode: OpCode) -> Option<&dyn Kernel> {
        self.index_of(opcode).and_then(|i| self.kernel(i))
    }

    pub(crate) fn kernel(&self, index: usize) -> Option<&dyn Kernel> {
        self.kernels.get(index).map(|k| k.as_ref())
    }

    pub fn opcodes(&self) -> Vec<OpCode> {
        self.kernels.iter().map(|k| k.opcode()).collect()
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl std::fmt::Debug for OpResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpResolver")
            .field("kernels", &self.kernels.iter().map(|k| k.name()).collect::<Vec<_>>())
            .field("capacity", &self.capacity)
            .finish()
    }
}

fn builtin_kernels() -> Vec<Box<dyn Kernel>> {
    vec![
        Box::new(Conv2dKernel),
        Box::new(DepthwiseConv2dKernel),
        Box::new(FullyConnectedKernel),
        Box::new(AveragePool2dKernel),
        Box::new(MaxPool2dKernel),
        Box::new(SoftmaxKernel),
        Box::new(ReshapeKernel),
    ]
}
