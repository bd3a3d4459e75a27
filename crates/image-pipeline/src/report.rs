// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-batch results.

use std::time::Duration;

/// What one inference produced.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct InferenceResult {
    /// Wall-clock invoke time in microseconds.
    pub micros: u64,
    /// Raw quantized value of the first output element.
    pub first_output: i32,
    /// Index of the largest output element.
    pub top_class: usize,
    /// Dequantized value of the top class.
    pub score: f32,
}

/// Outcome of one file.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageOutcome {
    Processed(InferenceResult),
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ImageRecord {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub outcome: ImageOutcome,
}

/// Outcomes of a `process_images` run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BatchReport {
    pub model: String,
    pub image_dir: String,
    pub images: Vec<ImageRecord>,
    /// Wall-clock time of the whole batch.
    pub total_duration: Duration,
}

impl BatchReport {
    pub fn new(model: impl Into<String>, image_dir: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            image_dir: image_dir.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, name: impl Into<String>, path: impl Into<String>, outcome: ImageOutcome) {
        self.images.push(ImageRecord {
            name: name.into(),
            path: path.into(),
            outcome,
        });
    }

    pub fn processed(&self) -> usize {
        self.results().count()
    }

    pub fn skipped(&self) -> usize {
        self.images.len() - self.processed()
    }

    /// Results of the processed images, in order.
    pub fn results(&self) -> impl Iterator<Item = &InferenceResult> {
        self.images.iter().filter_map(|r| match &r.outcome {
            ImageOutcome::Processed(res) => Some(res),
            ImageOutcome::Skipped { .. } => None,
        })
    }

    /// Mean invoke time over processed images.
    pub fn mean_latency(&self) -> Option<Duration> {
        let n = self.processed() as u64;
        if n == 0 {
            return None;
        }
        let total: u64 = self.results().map(|r| r.micros).sum();
        Some(Duration::from_micros(total / n))
    }

    /// Returns a human-readable summary suitable for CLI output.
    ///
    /// # Example output
    /// ```text
    /// Batch 'demo' on /spiffs/images: 3 processed, 1 skipped, mean 812us, total 4.10ms
    /// ```
    pub fn summary(&self) -> String {
        let mean = self
            .mean_latency()
            .map(|d| format!("{}us", d.as_micros()))
            .unwrap_or_else(|| "n/a".into());
        format!(
            "Batch '{}' on {}: {} processed, {} skipped, mean {mean}, total {:.2}ms",
            self.model,
            self.image_dir,
            self.processed(),
            self.skipped(),
            self.total_duration.as_secs_f64() * 1000.0,
        )
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(micros: u64) -> ImageOutcome {
        ImageOutcome::Processed(InferenceResult {
            micros,
            first_output: -128,
            top_class: 2,
            score: 0.75,
        })
    }

    #[test]
    fn test_counts_and_mean() {
        let mut r = BatchReport::new("m", "/spiffs/images");
        assert_eq!(r.mean_latency(), None);
        r.record("a.bin", "/spiffs/images/a.bin", result(100));
        r.record(
            "b.bin",
            "/spiffs/images/b.bin",
            ImageOutcome::Skipped {
                reason: "short read".into(),
            },
        );
        r.record("c.bin", "/spiffs/images/c.bin", result(300));
        assert_eq!(r.processed(), 2);
        assert_eq!(r.skipped(), 1);
        assert_eq!(r.mean_latency(), Some(Duration::from_micros(200)));
        assert!(r.summary().contains("2 processed, 1 skipped, mean 200us"));
    }

    #[test]
    fn test_json_shape() {
        let mut r = BatchReport::new("m", "/spiffs/images");
        r.record("a.bin", "/spiffs/images/a.bin", result(5));
        r.record("b.bin", "/spiffs/images/b.bin", ImageOutcome::Skipped { reason: "bad".into() });
        let v: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        assert_eq!(v["images"][0]["status"], "processed");
        assert_eq!(v["images"][0]["top_class"], 2);
        assert_eq!(v["images"][1]["status"], "skipped");
        assert_eq!(v["images"][1]["reason"], "bad");
    }
}
