// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Mount configuration.

use std::path::PathBuf;

/// How the partition is mounted.
///
/// Defaults follow a typical SPIFFS setup: mounted at `/spiffs`, five file
/// handles, formatted on first mount, and a 64-byte path buffer.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MountConfig {
    /// Virtual mount point every path must live under.
    pub base_path: String,
    /// Host directory that backs the partition.
    pub root: PathBuf,
    /// Partition capacity in bytes.
    pub partition_size: u64,
    /// Maximum number of simultaneously open files.
    pub max_files: usize,
    /// Create the backing directory if it does not exist.
    pub format_if_mount_failed: bool,
    /// Longest accepted virtual path, in bytes.
    pub max_path_len: usize,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            base_path: "/spiffs".into(),
            root: PathBuf::from("spiffs"),
            partition_size: 1024 * 1024,
            max_files: 5,
            format_if_mount_failed: true,
            max_path_len: 64,
        }
    }
}

impl MountConfig {
    /// A default config backed by `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Joins `name` onto the mount point, e.g. `"img"` -> `"/spiffs/img"`.
    pub fn virtual_path(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.base_path.trim_end_matches('/'),
            name.trim_start_matches('/')
        )
    }
}
