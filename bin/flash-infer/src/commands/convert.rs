// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `flash-infer convert`: encoded images to raw `.bin` input files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use image_pipeline::RunnerConfig;

pub fn execute(
    config: &RunnerConfig,
    inputs: &[PathBuf],
    out_dir: &Path,
    resize: bool,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create '{}'", out_dir.display()))?;

    let spec = &config.image;
    println!(
        "  Converting {} image(s) to {}x{}x{}{}",
        inputs.len(),
        spec.width,
        spec.height,
        spec.channels,
        if resize { " (resizing)" } else { "" },
    );

    let mut failed = 0;
    for input in inputs {
        let output = output_path(input, out_dir);
        match image_pipeline::convert_to_raw(input, &output, spec, resize) {
            Ok(bytes) => println!(
                "   {} -> {} ({bytes} bytes)",
                input.display(),
                output.display()
            ),
            Err(e) => {
                tracing::error!(input = %input.display(), "conversion failed: {e}");
                println!("   {}: FAILED: {e}", input.display());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} conversions failed", inputs.len());
    }
    Ok(())
}

/// `photos/cat.png` -> `<out_dir>/cat.bin`.
fn output_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy().into_owned());
    out_dir.join(format!("{stem}.bin"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("photos/cat.png"), Path::new("out")),
            PathBuf::from("out/cat.bin")
        );
        assert_eq!(
            output_path(Path::new("digit.7.jpeg"), Path::new(".")),
            PathBuf::from("./digit.7.bin")
        );
    }
}
