// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `flash-infer demo-model`: write the built-in classifier.

use std::path::Path;

use anyhow::Context;
use image_pipeline::RunnerConfig;
use model_ir::Model;

pub fn execute(config: &RunnerConfig, out: &Path, classes: usize) -> anyhow::Result<()> {
    let blob = image_pipeline::demo::classifier_model(&config.image, classes)
        .context("failed to build demo model")?;
    let model = Model::from_vec(blob.clone()).context("demo model does not load")?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create '{}'", parent.display()))?;
    }
    std::fs::write(out, &blob).with_context(|| format!("cannot write '{}'", out.display()))?;

    println!("  {}", model.graph().summary());
    println!("  Wrote {} bytes to {}", blob.len(), out.display());
    Ok(())
}
