// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `flash-infer run`: boot the pipeline and classify every image.
//!
//! ```text
//! mount ──► load model ──► resolver ──► arena ──► allocate ──► per-image loop
//! ```

use std::path::PathBuf;

use anyhow::Context;
use image_pipeline::RunnerConfig;

/// Flags that replace values from the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub model: Option<PathBuf>,
    pub arena_size: Option<String>,
    pub image_dir: Option<String>,
    pub root: Option<PathBuf>,
    pub extensions: Option<String>,
}

impl Overrides {
    fn apply(self, config: &mut RunnerConfig) {
        if let Some(model) = self.model {
            config.model_path = model;
        }
        if let Some(arena_size) = self.arena_size {
            config.arena_size = arena_size;
        }
        if let Some(image_dir) = self.image_dir {
            config.image_dir = image_dir;
        }
        if let Some(root) = self.root {
            config.storage.root = root;
        }
        if let Some(extensions) = self.extensions {
            config.extensions = extensions
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
        }
    }
}

pub fn execute(
    mut config: RunnerConfig,
    overrides: Overrides,
    report_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    overrides.apply(&mut config);

    println!("  Config:");
    println!("   Model:      {}", config.model_path.display());
    println!("   Arena:      {}", config.arena_size);
    println!(
        "   Partition:  {} -> {}",
        config.storage.base_path,
        config.storage.root.display()
    );
    println!("   Images:     {} ({})", config.image_dir, config.extensions.join(", "));
    println!(
        "   Input:      {}x{}x{}",
        config.image.width, config.image.height, config.image.channels
    );
    println!();

    let mut pipeline = image_pipeline::boot(&config).context("boot failed")?;
    println!("  {}", pipeline.interpreter().model().summary());
    println!("  {}", pipeline.interpreter().arena_stats().summary());
    println!();

    let report = pipeline
        .process_images()
        .with_context(|| format!("cannot process '{}'", config.image_dir))?;

    println!(
        "  {:<24} {:>10} {:>8} {:>8} {:>8}",
        "Image", "Time", "Output", "Class", "Score"
    );
    println!("  {}", "-".repeat(62));
    for record in &report.images {
        match &record.outcome {
            image_pipeline::ImageOutcome::Processed(r) => println!(
                "  {:<24} {:>8}us {:>8} {:>8} {:>8.3}",
                truncate(&record.name, 24),
                r.micros,
                r.first_output,
                r.top_class,
                r.score,
            ),
            image_pipeline::ImageOutcome::Skipped { reason } => {
                println!("  {:<24} skipped: {reason}", truncate(&record.name, 24))
            }
        }
    }
    println!();
    println!("  {}", report.summary());

    if let Some(path) = report_path {
        let json = report.to_json().context("cannot serialise report")?;
        std::fs::write(&path, json)
            .with_context(|| format!("cannot write report '{}'", path.display()))?;
        println!("  Report written to {}", path.display());
    }

    Ok(())
}

/// Truncates a string to `max_len` characters with an ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
