// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model blob loading.
//!
//! A model blob is a SafeTensors container. Its `__metadata__` map carries
//! the format tag, the schema version and the graph manifest as JSON;
//! constant tensors are stored under their tensor names.
//!
//! The blob is never copied. It is borrowed from a `'static` slice (the
//! firmware's embedded model array), owned, or memory-mapped from a file,
//! and constant tensors are served as views straight into it.

use crate::graph::{ModelGraph, Validated};
use crate::{ModelError, ModelManifest};
use safetensors::SafeTensors;
use std::ops::Range;
use std::path::Path;
use tensor_core::{DType, TensorView};

/// Schema version this runtime reads and writes.
pub const SCHEMA_VERSION: u32 = 3;

/// Value of the `format` metadata key.
pub const FORMAT_NAME: &str = "flash-infer";

pub(crate) const META_FORMAT: &str = "format";
pub(crate) const META_SCHEMA_VERSION: &str = "schema_version";
pub(crate) const META_GRAPH: &str = "graph";

/// Backing storage for a model blob.
#[derive(Debug)]
pub enum ModelData {
    /// Blob compiled into the binary.
    Static(&'static [u8]),
    /// Blob owned on the heap.
    Owned(Vec<u8>),
    /// Blob memory-mapped from a file.
    Mapped(memmap2::Mmap),
}

impl ModelData {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ModelData::Static(b) => *b,
            ModelData::Owned(v) => v.as_slice(),
            ModelData::Mapped(m) => &m[..],
        }
    }
}

/// A loaded, version-checked and validated model.
///
/// # Example
/// ```no_run
/// use model_ir::Model;
///
/// let model = Model::open("model.safetensors").unwrap();
/// println!("{}", model.summary());
/// for op in model.graph().iter_operators() {
///     println!("  {}", op.summary());
/// }
/// ```
#[derive(Debug)]
pub struct Model {
    data: ModelData,
    version: u32,
    graph: ModelGraph<Validated>,
    /// Byte range of each constant tensor inside `data`, indexed by tensor.
    constants: Vec<Option<Range<usize>>>,
}

impl Model {
    /// Memory-maps and loads a model file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        // SAFETY: the mapping is read-only and the file is not expected to be
        // modified while the model is alive.
        let mmap = unsafe { memmap2::Mmap::map(&file) }?;
        tracing::debug!(path = %path.display(), bytes = mmap.len(), "mapped model file");
        Self::from_data(ModelData::Mapped(mmap))
    }

    /// Loads a model embedded in the binary.
    pub fn from_static(bytes: &'static [u8]) -> Result<Self, ModelError> {
        Self::from_data(ModelData::Static(bytes))
    }

    /// Loads a model from owned bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self, ModelError> {
        Self::from_data(ModelData::Owned(bytes))
    }

    /// Parses the container, checks format and schema version, validates the
    /// graph and locates every constant.
    pub fn from_data(data: ModelData) -> Result<Self, ModelError> {
        let bytes = data.as_bytes();
        let (header_len, metadata) = SafeTensors::read_metadata(bytes)?;
        let data_start = 8 + header_len;

        let meta = metadata
            .metadata()
            .as_ref()
            .ok_or(ModelError::MissingMetadata { key: "__metadata__" })?;
        let lookup = |key: &'static str| {
            meta.get(key)
                .map(String::as_str)
                .ok_or(ModelError::MissingMetadata { key })
        };

        let format = lookup(META_FORMAT)?;
        if format != FORMAT_NAME {
            return Err(ModelError::UnknownFormat {
                found: format.to_string(),
            });
        }

        let raw_version = lookup(META_SCHEMA_VERSION)?;
        let version: u32 = raw_version
            .trim()
            .parse()
            .map_err(|_| ModelError::InvalidSchemaVersion(raw_version.to_string()))?;
        if version != SCHEMA_VERSION {
            return Err(ModelError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found: version,
            });
        }

        let manifest = ModelManifest::from_json(lookup(META_GRAPH)?)?;
        let graph = ModelGraph::new(manifest).validate()?;

        let mut constants = vec![None; graph.tensors.len()];
        for (index, def) in graph.tensors.iter().enumerate() {
            if !def.constant {
                continue;
            }
            let info = metadata
                .info(&def.name)
                .ok_or_else(|| ModelError::ConstantNotFound {
                    name: def.name.clone(),
                })?;
            let stored = convert_safetensor_dtype(info.dtype)?;
            if stored != def.dtype || info.shape != def.shape.dims() {
                return Err(ModelError::InvalidTensor {
                    tensor: def.name.clone(),
                    detail: format!(
                        "stored as {} {:?}, declared as {} {}",
                        stored, info.shape, def.dtype, def.shape
                    ),
                });
            }
            let (start, end) = info.data_offsets;
            constants[index] = Some(data_start + start..data_start + end);
        }

        tracing::debug!(
            model = %graph.name,
            version,
            operators = graph.num_operators(),
            "model loaded"
        );

        Ok(Self {
            data,
            version,
            graph,
            constants,
        })
    }

    /// Schema version stored in the blob.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The validated operator graph.
    pub fn graph(&self) -> &ModelGraph<Validated> {
        &self.graph
    }

    pub fn name(&self) -> &str {
        &self.graph.name
    }

    /// Raw bytes of a constant tensor, or `None` if `tensor` is not constant.
    pub fn constant_data(&self, tensor: usize) -> Option<&[u8]> {
        let range = self.constants.get(tensor)?.clone()?;
        self.data.as_bytes().get(range)
    }

    /// A typed view of a constant tensor.
    pub fn constant_view(&self, tensor: usize) -> Option<TensorView<'_>> {
        let def = self.graph.tensor(tensor)?;
        let data = self.constant_data(tensor)?;
        TensorView::new(&def.shape, def.dtype, def.quantization, data).ok()
    }

    /// Size of the whole blob in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.as_bytes().len()
    }

    /// Returns `true` if the blob is memory-mapped from a file.
    pub fn is_mapped(&self) -> bool {
        matches!(self.data, ModelData::Mapped(_))
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        format!(
            "{} (schema v{}, {} byte blob)",
            self.graph.summary(),
            self.version,
            self.size_bytes()
        )
    }
}

/// Maps a SafeTensors dtype to a tensor-core dtype.
pub(crate) fn convert_safetensor_dtype(st_dtype: safetensors::Dtype) -> Result<DType, ModelError> {
    match st_dtype {
        safetensors::Dtype::U8 => Ok(DType::U8),
        safetensors::Dtype::I8 => Ok(DType::I8),
        safetensors::Dtype::I32 => Ok(DType::I32),
        safetensors::Dtype::F32 => Ok(DType::F32),
        other => Err(ModelError::SafeTensorsError(format!(
            "unsupported SafeTensors dtype: {other:?}"
        ))),
    }
}

/// Maps a tensor-core dtype to its SafeTensors counterpart.
pub(crate) fn to_safetensor_dtype(dtype: DType) -> safetensors::Dtype {
    match dtype {
        DType::U8 => safetensors::Dtype::U8,
        DType::I8 => safetensors::Dtype::I8,
        DType::I32 => safetensors::Dtype::I32,
        DType::F32 => safetensors::Dtype::F32,
    }
}
