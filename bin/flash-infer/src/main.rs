// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # flash-infer
//!
//! Command-line interface for the flash-infer image runner.
//!
//! ## Usage
//! ```bash
//! # Classify every image in the configured directory
//! flash-infer --config device.toml run --report report.json
//!
//! # Inspect a model and check it against an arena size
//! flash-infer inspect --model spiffs/model.fim --arena 96K
//!
//! # Show partition usage and the files on it
//! flash-infer storage
//!
//! # Turn PNG/JPEG images into raw input files
//! flash-infer convert photos/*.png --out-dir spiffs/images --resize
//!
//! # Write the built-in demo classifier
//! flash-infer demo-model --out spiffs/model.fim
//! ```

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "flash-infer",
    about = "Runs a quantized image model over files on a flash partition",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file. Flags override its values.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Raise the log level (repeat for more: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot the device pipeline and classify every image.
    Run {
        /// Model blob on the host filesystem.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Tensor arena size (e.g., "96K", "1M").
        #[arg(short, long)]
        arena_size: Option<String>,

        /// Virtual directory holding the images (e.g., "/spiffs/images").
        #[arg(short, long)]
        image_dir: Option<String>,

        /// Host directory backing the partition.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Comma-separated image extensions to process (e.g., "bin,png").
        #[arg(short, long)]
        extensions: Option<String>,

        /// Write the batch report as JSON to this path.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print a model's graph, operators and arena plan.
    Inspect {
        /// Path to the model blob.
        #[arg(short, long)]
        model: PathBuf,

        /// Arena size to check the plan against (defaults to the config).
        #[arg(short, long)]
        arena: Option<String>,
    },

    /// Mount the partition and print its usage and files.
    Storage {
        /// Virtual directory to list (defaults to the mount point).
        #[arg(short, long)]
        dir: Option<String>,
    },

    /// Convert encoded images into raw input files.
    Convert {
        /// Encoded images (PNG, JPEG, BMP, PNM).
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory the `.bin` files are written to.
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Resize to the configured input size instead of rejecting mismatches.
        #[arg(long)]
        resize: bool,
    },

    /// Write the deterministic demo classifier.
    DemoModel {
        /// Output path for the model blob.
        #[arg(short, long, default_value = "model.fim")]
        out: PathBuf,

        /// Number of output classes.
        #[arg(long, default_value_t = 10)]
        classes: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;
    commands::init_tracing(cli.verbose, &config.log_level);

    match cli.command {
        Commands::Run {
            model,
            arena_size,
            image_dir,
            root,
            extensions,
            report,
        } => {
            let overrides = commands::run::Overrides {
                model,
                arena_size,
                image_dir,
                root,
                extensions,
            };
            commands::run::execute(config, overrides, report)
        }
        Commands::Inspect { model, arena } => commands::inspect::execute(&config, model, arena),
        Commands::Storage { dir } => commands::storage::execute(&config, dir),
        Commands::Convert {
            inputs,
            out_dir,
            resize,
        } => commands::convert::execute(&config, &inputs, &out_dir, resize),
        Commands::DemoModel { out, classes } => commands::demo_model::execute(&config, &out, classes),
    }
}
