// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runner configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! model_path = "spiffs/model.fim"
//! arena_size = "128K"
//! image_dir = "/spiffs/images"
//! extensions = ["bin"]
//! log_level = "info"
//!
//! [image]
//! width = 64
//! height = 64
//! channels = 1
//!
//! [storage]
//! base_path = "/spiffs"
//! root = "spiffs"
//! partition_size = 1048576
//! max_files = 5
//! format_if_mount_failed = true
//! ```

use crate::{ImageSpec, PipelineError};
use flash_storage::MountConfig;
use std::path::{Path, PathBuf};
use tensor_arena::ByteSize;

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Host path of the model blob.
    pub model_path: PathBuf,
    /// Tensor arena size (human-readable, e.g. `"128K"`).
    pub arena_size: String,
    /// Virtual directory on the partition holding the images.
    pub image_dir: String,
    /// File extensions to process, without the leading dot.
    pub extensions: Vec<String>,
    /// Default log filter when neither `-v` nor `RUST_LOG` is given.
    pub log_level: String,
    pub image: ImageSpec,
    pub storage: MountConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("spiffs/model.fim"),
            arena_size: "128K".to_string(),
            image_dir: "/spiffs/images".to_string(),
            extensions: vec!["bin".to_string()],
            log_level: "info".to_string(),
            image: ImageSpec::default(),
            storage: MountConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, PipelineError> {
        toml::from_str(toml_str)
            .map_err(|e| PipelineError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("TOML serialise error: {e}")))
    }

    /// Parses the arena size string into a [`ByteSize`].
    pub fn parse_arena_size(&self) -> Result<ByteSize, PipelineError> {
        ByteSize::parse(&self.arena_size)
            .map_err(|e| PipelineError::Config(format!("invalid arena size: {e}")))
    }

    /// The partition mount settings.
    pub fn mount_config(&self) -> MountConfig {
        self.storage.clone()
    }

    /// Whether `name` carries one of the configured extensions.
    ///
    /// Matching is on the final extension, case-insensitive; a leading dot
    /// in the configured list is ignored.
    pub fn matches_extension(&self, name: &str) -> bool {
        has_extension(&self.extensions, name)
    }
}

pub(crate) fn has_extension(extensions: &[String], name: &str) -> bool {
    let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = RunnerConfig::default();
        assert_eq!(c.arena_size, "128K");
        assert_eq!(c.image.byte_len(), 64 * 64);
        assert_eq!(c.extensions, vec!["bin"]);
        assert_eq!(c.storage.base_path, "/spiffs");
    }

    #[test]
    fn test_parse_arena_size() {
        let c = RunnerConfig {
            arena_size: "96K".into(),
            ..Default::default()
        };
        assert_eq!(c.parse_arena_size().unwrap().as_bytes(), 96 * 1024);

        let bad = RunnerConfig {
            arena_size: "lots".into(),
            ..Default::default()
        };
        assert!(matches!(bad.parse_arena_size(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
model_path = "/tmp/net.fim"
arena_size = "64K"
extensions = ["bin", ".png"]

[image]
width = 28
height = 28

[storage]
root = "/tmp/flash"
max_files = 2
"#;
        let c = RunnerConfig::from_toml(toml).unwrap();
        assert_eq!(c.model_path, PathBuf::from("/tmp/net.fim"));
        assert_eq!(c.image.width, 28);
        assert_eq!(c.image.channels, 1);
        assert_eq!(c.storage.max_files, 2);
        assert_eq!(c.storage.base_path, "/spiffs");
        assert_eq!(c.image_dir, "/spiffs/images");
        assert!(c.matches_extension("x.PNG"));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = RunnerConfig::default();
        let back = RunnerConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_matches_extension() {
        let c = RunnerConfig::default();
        assert!(c.matches_extension("cat.bin"));
        assert!(c.matches_extension("CAT.BIN"));
        assert!(!c.matches_extension("cat.bin.txt"));
        assert!(!c.matches_extension("binary"));
        assert!(!c.matches_extension("notes.txt"));
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        assert!(RunnerConfig::from_toml("model_path = 3").is_err());
    }
}
