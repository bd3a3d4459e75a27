// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Device boot: mount, load, resolve, allocate.
//!
//! ```text
//! mount storage → load model (schema check) → op resolver (7 ops)
//!   → arena → allocate_tensors → ImagePipeline
//! ```
//!
//! Every step logs its failure and aborts the boot.

use crate::{ImagePipeline, PipelineError, RunnerConfig};
use flash_storage::FlashStorage;
use interpreter::{Interpreter, InterpreterError, OpResolver};
use model_ir::Model;
use tensor_arena::TensorArena;

/// Kernel slots in the device resolver.
pub const RESOLVER_CAPACITY: usize = 10;

/// The resolver the device registers: every builtin op, capacity 10.
pub fn device_resolver() -> Result<OpResolver, InterpreterError> {
    let mut resolver = OpResolver::with_capacity(RESOLVER_CAPACITY);
    resolver
        .add_conv2d()?
        .add_depthwise_conv2d()?
        .add_softmax()?
        .add_fully_connected()?
        .add_average_pool2d()?
        .add_max_pool2d()?
        .add_reshape()?;
    Ok(resolver)
}

/// Boots with the model at `config.model_path`.
pub fn boot(config: &RunnerConfig) -> Result<ImagePipeline, PipelineError> {
    let storage = mount(config)?;
    let model = Model::open(&config.model_path).map_err(|e| {
        tracing::error!(path = %config.model_path.display(), "failed to load model: {e}");
        e
    })?;
    start(config, storage, model)
}

/// Boots with an already loaded model, e.g. one embedded with
/// [`Model::from_static`].
pub fn boot_with_model(config: &RunnerConfig, model: Model) -> Result<ImagePipeline, PipelineError> {
    let storage = mount(config)?;
    start(config, storage, model)
}

fn mount(config: &RunnerConfig) -> Result<FlashStorage, PipelineError> {
    FlashStorage::mount(config.mount_config()).map_err(|e| {
        tracing::error!("failed to mount partition: {e}");
        PipelineError::from(e)
    })
}

fn start(
    config: &RunnerConfig,
    storage: FlashStorage,
    model: Model,
) -> Result<ImagePipeline, PipelineError> {
    tracing::info!("{}", model.summary());
    let resolver = device_resolver()?;
    let arena = TensorArena::new(config.parse_arena_size()?);
    let interpreter = Interpreter::new(model, resolver, arena)
        .allocate_tensors()
        .map_err(|e| {
            tracing::error!("failed to allocate tensors: {e}");
            e
        })?;
    tracing::info!("model successfully loaded");
    ImagePipeline::new(storage, interpreter, config)
}
