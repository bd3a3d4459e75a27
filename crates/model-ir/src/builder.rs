// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Programmatic construction of model blobs.

use crate::manifest::{ModelManifest, TensorDef};
use crate::model::{
    to_safetensor_dtype, FORMAT_NAME, META_FORMAT, META_GRAPH, META_SCHEMA_VERSION,
    SCHEMA_VERSION,
};
use crate::{ModelError, OpCode, OpOptions, OperatorDef};
use std::collections::HashMap;
use tensor_core::{DType, QuantParams, Shape, Tensor};

/// Assembles a tensor table and operator list and serializes them into a
/// model blob readable by [`crate::Model`].
///
/// # Example
/// ```
/// use model_ir::{Model, ModelBuilder, OpCode, OpOptions};
/// use tensor_core::{DType, QuantParams, Shape};
///
/// let q = Some(QuantParams::new(1.0, 0));
/// let mut b = ModelBuilder::new("flatten");
/// let x = b.add_tensor("x", Shape::nhwc(1, 2, 2, 1), DType::U8, q);
/// let y = b.add_tensor("y", Shape::matrix(1, 4), DType::U8, q);
/// b.add_operator(OpCode::Reshape, vec![Some(x)], y, OpOptions::default());
/// b.set_inputs(vec![x]);
/// b.set_outputs(vec![y]);
///
/// let model = Model::from_vec(b.build().unwrap()).unwrap();
/// assert_eq!(model.graph().num_operators(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    name: String,
    description: Option<String>,
    schema_version: u32,
    tensors: Vec<TensorDef>,
    constants: Vec<(String, Vec<u8>)>,
    operators: Vec<OperatorDef>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            schema_version: SCHEMA_VERSION,
            tensors: Vec::new(),
            constants: Vec::new(),
            operators: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Overrides the schema version written to the blob.
    pub fn schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    /// Adds an activation tensor and returns its index.
    pub fn add_tensor(
        &mut self,
        name: impl Into<String>,
        shape: Shape,
        dtype: DType,
        quantization: Option<QuantParams>,
    ) -> usize {
        self.tensors.push(TensorDef {
            name: name.into(),
            shape,
            dtype,
            quantization,
            constant: false,
        });
        self.tensors.len() - 1
    }

    /// Adds a constant tensor with its data and returns its index.
    pub fn add_constant(
        &mut self,
        name: impl Into<String>,
        shape: Shape,
        dtype: DType,
        quantization: Option<QuantParams>,
        data: Vec<u8>,
    ) -> Result<usize, ModelError> {
        let name = name.into();
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(ModelError::InvalidTensor {
                tensor: name,
                detail: format!("expected {expected} bytes of data, got {}", data.len()),
            });
        }
        self.tensors.push(TensorDef {
            name: name.clone(),
            shape,
            dtype,
            quantization,
            constant: true,
        });
        self.constants.push((name, data));
        Ok(self.tensors.len() - 1)
    }

    /// Adds an owned [`Tensor`] as a constant.
    pub fn add_constant_tensor(
        &mut self,
        name: impl Into<String>,
        tensor: &Tensor,
    ) -> Result<usize, ModelError> {
        self.add_constant(
            name,
            tensor.shape().clone(),
            tensor.dtype(),
            tensor.quant(),
            tensor.as_bytes().to_vec(),
        )
    }

    /// Appends an operator writing `output`.
    pub fn add_operator(
        &mut self,
        opcode: OpCode,
        inputs: Vec<Option<usize>>,
        output: usize,
        options: OpOptions,
    ) -> &mut Self {
        self.operators.push(OperatorDef {
            opcode,
            inputs,
            outputs: vec![output],
            options,
        });
        self
    }

    pub fn set_inputs(&mut self, inputs: Vec<usize>) -> &mut Self {
        self.inputs = inputs;
        self
    }

    pub fn set_outputs(&mut self, outputs: Vec<usize>) -> &mut Self {
        self.outputs = outputs;
        self
    }

    #[cfg(test)]
    pub(crate) fn drop_constant_data(&mut self, name: &str) {
        self.constants.retain(|(n, _)| n != name);
    }

    /// The manifest that will be embedded in the blob.
    pub fn manifest(&self) -> ModelManifest {
        ModelManifest {
            name: self.name.clone(),
            description: self.description.clone(),
            tensors: self.tensors.clone(),
            operators: self.operators.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
        }
    }

    /// Serializes the model into a SafeTensors blob.
    ///
    /// The graph is not validated here; [`crate::Model`] validates on load.
    pub fn build(&self) -> Result<Vec<u8>, ModelError> {
        let mut metadata = HashMap::new();
        metadata.insert(META_FORMAT.to_string(), FORMAT_NAME.to_string());
        metadata.insert(
            META_SCHEMA_VERSION.to_string(),
            self.schema_version.to_string(),
        );
        metadata.insert(META_GRAPH.to_string(), self.manifest().to_json()?);

        let mut views = Vec::with_capacity(self.constants.len());
        for (name, data) in &self.constants {
            let Some(def) = self.tensors.iter().find(|t| &t.name == name) else {
                continue;
            };
            let view = safetensors::tensor::TensorView::new(
                to_safetensor_dtype(def.dtype),
                def.shape.dims().to_vec(),
                data,
            )?;
            views.push((name.clone(), view));
        }

        let blob = safetensors::serialize(views, &Some(metadata))?;
        tracing::debug!(
            model = %self.name,
            bytes = blob.len(),
            constants = self.constants.len(),
            "serialized model blob"
        );
        Ok(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_constant_size_checked() {
        let mut b = ModelBuilder::new("x");
        let err = b.add_constant("w", Shape::vector(4), DType::I32, None, vec![0; 4]);
        assert!(matches!(err, Err(ModelError::InvalidTensor { .. })));
    }

    #[test]
    fn test_indices_are_sequential() {
        let mut b = ModelBuilder::new("x");
        assert_eq!(b.add_tensor("a", Shape::vector(1), DType::I32, None), 0);
        let c = b
            .add_constant_tensor("b", &Tensor::from_i32(Shape::vector(1), &[7]).unwrap())
            .unwrap();
        assert_eq!(c, 1);
        let m = b.manifest();
        assert!(m.tensors[1].constant);
        assert_eq!(m.constant_bytes(), 4);
    }

    #[test]
    fn test_build_writes_metadata() {
        let mut b = ModelBuilder::new("meta").description("d");
        let t = b.add_tensor("t", Shape::vector(2), DType::I32, None);
        b.set_inputs(vec![t]).set_outputs(vec![t]);
        let blob = b.build().unwrap();

        let (_, meta) = safetensors::SafeTensors::read_metadata(&blob).unwrap();
        let map = meta.metadata().as_ref().unwrap();
        assert_eq!(map.get("format").map(String::as_str), Some("flash-infer"));
        assert_eq!(map.get("schema_version").map(String::as_str), Some("3"));
        assert!(map["graph"].contains("\"description\":\"d\""));
    }
}
