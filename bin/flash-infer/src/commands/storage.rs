// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `flash-infer storage`: mount the partition and list its files.

use anyhow::Context;
use flash_storage::FlashStorage;
use image_pipeline::RunnerConfig;

pub fn execute(config: &RunnerConfig, dir: Option<String>) -> anyhow::Result<()> {
    let storage = FlashStorage::mount(config.mount_config()).with_context(|| {
        format!(
            "failed to mount '{}' at {}",
            config.storage.root.display(),
            config.storage.base_path
        )
    })?;
    let info = storage.info()?;

    println!("  Mount");
    println!("   Point:      {}", storage.config().base_path);
    println!("   Backing:    {}", storage.config().root.display());
    println!("   Max files:  {}", storage.config().max_files);
    println!("   {}", info.summary());
    println!("   Free:       {:.1} KB", info.free_bytes() as f64 / 1024.0);
    println!();

    let dir = dir.unwrap_or_else(|| storage.config().base_path.clone());
    let entries = storage
        .read_dir(&dir)
        .with_context(|| format!("cannot list '{dir}'"))?;

    println!("  {dir}");
    if entries.is_empty() {
        println!("   (no files)");
    }
    for entry in &entries {
        let marker = if config.matches_extension(&entry.name) { "*" } else { " " };
        println!("  {marker} {:<40} {:>10} B", entry.name, entry.len);
    }
    println!();
    println!("  * matches the configured extensions ({})", config.extensions.join(", "));

    Ok(())
}
