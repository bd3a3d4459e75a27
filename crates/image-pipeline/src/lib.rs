// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # image-pipeline
//!
//! Boots the device and runs a quantized classifier over a directory of
//! fixed-size images on the flash partition.
//!
//! The flow is single-threaded and linear:
//! mount → load model → configure resolver → allocate tensors →
//! enumerate files → (read → copy → invoke → log) per file.
//!
//! A boot failure aborts the run. A failure on one image is logged, the
//! image is recorded as skipped, and the loop moves on.
//!
//! # Example
//! ```no_run
//! use image_pipeline::{boot, RunnerConfig};
//!
//! # fn example() -> Result<(), image_pipeline::PipelineError> {
//! let config = RunnerConfig::from_file("flash-infer.toml".as_ref())?;
//! let mut pipeline = boot(&config)?;
//! let report = pipeline.process_images()?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

mod boot;
mod config;
pub mod demo;
mod error;
mod source;
mod pipeline;
mod report;

pub use boot::{boot, boot_with_model, device_resolver, RESOLVER_CAPACITY};
pub use config::RunnerConfig;
pub use error::PipelineError;
pub use source::{convert_to_raw, decode_into, load_image, read_raw, ImageSource, ImageSpec};
pub use pipeline::ImagePipeline;
pub use report::{BatchReport, ImageOutcome, ImageRecord, InferenceResult};
