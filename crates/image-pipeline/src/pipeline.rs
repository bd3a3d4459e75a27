// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The per-image inference loop.

use crate::config::has_extension;
use crate::source::load_image;
use crate::{BatchReport, ImageOutcome, ImageSpec, InferenceResult, PipelineError, RunnerConfig};
use flash_storage::FlashStorage;
use interpreter::{Allocated, Interpreter};
use std::time::Instant;
use tensor_core::DType;

/// A booted device: mounted storage plus an allocated interpreter whose
/// input matches the configured image geometry.
#[derive(Debug)]
pub struct ImagePipeline {
    storage: FlashStorage,
    interpreter: Interpreter<Allocated>,
    spec: ImageSpec,
    image_dir: String,
    extensions: Vec<String>,
    /// Reused for every file.
    buffer: Vec<u8>,
}

impl ImagePipeline {
    /// Checks that the images have 1 or 3 channels, that input 0 is
    /// `[1, height, width, channels]` of `U8` or `I8`, and that output 0 is
    /// quantized.
    pub fn new(
        storage: FlashStorage,
        interpreter: Interpreter<Allocated>,
        config: &RunnerConfig,
    ) -> Result<Self, PipelineError> {
        let spec = config.image;
        if !matches!(spec.channels, 1 | 3) {
            return Err(PipelineError::UnsupportedChannels(spec.channels));
        }
        {
            let input = interpreter.input(0)?;
            let expected = spec.input_shape();
            if input.shape() != &expected {
                return Err(PipelineError::ModelMismatch(format!(
                    "input shape is {}, images are {expected}",
                    input.shape()
                )));
            }
            if !matches!(input.dtype(), DType::U8 | DType::I8) {
                return Err(PipelineError::ModelMismatch(format!(
                    "input dtype {} is not u8 or i8",
                    input.dtype()
                )));
            }
            let output = interpreter.output(0)?;
            if !output.dtype().is_quantized() || output.quant().is_none() {
                return Err(PipelineError::ModelMismatch(format!(
                    "output dtype {} is not quantized",
                    output.dtype()
                )));
            }
        }

        Ok(Self {
            storage,
            interpreter,
            spec,
            image_dir: config.image_dir.clone(),
            extensions: config.extensions.clone(),
            buffer: vec![0u8; spec.byte_len()],
        })
    }

    pub fn storage(&self) -> &FlashStorage {
        &self.storage
    }

    pub fn interpreter(&self) -> &Interpreter<Allocated> {
        &self.interpreter
    }

    pub fn spec(&self) -> &ImageSpec {
        &self.spec
    }

    /// Runs inference on every matching file in the image directory.
    ///
    /// A file that cannot be read or inferred is logged and recorded as
    /// skipped; only a failure to list the directory is returned.
    pub fn process_images(&mut self) -> Result<BatchReport, PipelineError> {
        let start = Instant::now();
        let entries = self.storage.read_dir(&self.image_dir).map_err(|e| {
            tracing::error!(dir = %self.image_dir, "failed to open image directory: {e}");
            e
        })?;
        let mut report = BatchReport::new(self.interpreter.model().name(), &self.image_dir);
        let mut buffer = std::mem::take(&mut self.buffer);

        for entry in entries {
            if !has_extension(&self.extensions, &entry.name) {
                tracing::trace!(file = %entry.name, "skipping non-image file");
                continue;
            }
            tracing::info!("Processing image: {}", entry.name);
            let outcome = load_image(&self.storage, &entry.path, &self.spec, &mut buffer)
                .and_then(|()| self.run_inference(&buffer));
            match outcome {
                Ok(result) => report.record(&entry.name, &entry.path, ImageOutcome::Processed(result)),
                Err(e) => {
                    tracing::error!(file = %entry.name, "{e}");
                    report.record(
                        &entry.name,
                        &entry.path,
                        ImageOutcome::Skipped {
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }

        self.buffer = buffer;
        report.total_duration = start.elapsed();
        tracing::info!("{}", report.summary());
        Ok(report)
    }

    /// Copies `pixels` into input 0, invokes the model and logs the result.
    ///
    /// `I8` inputs receive each pixel shifted by −128.
    pub fn run_inference(&mut self, pixels: &[u8]) -> Result<InferenceResult, PipelineError> {
        let expected = self.spec.byte_len();
        if pixels.len() != expected {
            return Err(PipelineError::ImageSize {
                path: "<buffer>".into(),
                expected,
                actual: pixels.len(),
            });
        }

        {
            let mut input = self.interpreter.input_mut(0)?;
            let signed = input.dtype() == DType::I8;
            let dst = input.as_bytes_mut();
            if signed {
                for (d, &p) in dst.iter_mut().zip(pixels) {
                    *d = p ^ 0x80;
                }
            } else {
                dst.copy_from_slice(pixels);
            }
        }

        let start = Instant::now();
        self.interpreter.invoke()?;
        let micros = start.elapsed().as_micros() as u64;
        tracing::info!("Inference time: {micros} microseconds");

        let output = self.interpreter.output(0)?;
        let values = output.to_i32_vec();
        let first_output = values.first().copied().unwrap_or_default();
        let top_class = values
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))
            .map(|(i, _)| i)
            .unwrap_or_default();
        let score = output.dequantize(top_class).unwrap_or_default();
        tracing::info!("Inference Output: {first_output}");
        tracing::info!(top_class, score, "top class");

        Ok(InferenceResult {
            micros,
            first_output,
            top_class,
            score,
        })
    }
}
