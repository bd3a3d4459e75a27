// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared setup.

pub mod convert;
pub mod demo_model;
pub mod inspect;
pub mod run;
pub mod storage;

use std::path::Path;

use anyhow::Context;
use image_pipeline::RunnerConfig;
use tracing_subscriber::EnvFilter;

/// Loads the config file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RunnerConfig> {
    match path {
        Some(path) => RunnerConfig::from_file(path)
            .with_context(|| format!("failed to load config '{}'", path.display())),
        None => Ok(RunnerConfig::default()),
    }
}

/// Installs the global subscriber.
///
/// `-v` wins over `RUST_LOG`, which wins over the config's `log_level`.
pub fn init_tracing(verbose: u8, config_level: &str) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
