// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! The model artifact consumed by the interpreter: a SafeTensors container
//! holding an operator graph and its constant tensors.
//!
//! - [`OpCode`] / [`OperatorDef`] / [`OpOptions`]: one computation step.
//! - [`ModelManifest`] / [`TensorDef`]: the JSON graph description.
//! - [`ModelGraph`]: the graph with a **type-state pattern**
//!   (`Loaded` → `Validated`).
//! - [`Model`]: a blob loaded from a static slice, a `Vec` or an mmap'd
//!   file, checked against [`SCHEMA_VERSION`].
//! - [`ModelBuilder`]: writes blobs.
//!
//! # Container Layout
//! `__metadata__` holds `format = "flash-infer"`, `schema_version` and
//! `graph` (the manifest JSON). Every constant tensor is stored under its
//! name with the dtype and shape the manifest declares.
//!
//! # Example
//! ```no_run
//! use model_ir::Model;
//!
//! let model = Model::open("./models/digits.safetensors").unwrap();
//! println!("{}", model.graph());
//! ```

mod builder;
mod error;
pub mod graph;
mod manifest;
mod model;
mod operator;

pub use builder::ModelBuilder;
pub use error::ModelError;
pub use graph::ModelGraph;
pub use manifest::{ModelManifest, TensorDef};
pub use model::{Model, ModelData, FORMAT_NAME, SCHEMA_VERSION};
pub use operator::{OpCode, OpOptions, OperatorDef};
