// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the flash partition.

/// Errors that can occur when mounting or reading the partition.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backing directory is missing or unusable and formatting is off.
    #[error("failed to mount {root}: {reason}")]
    MountFailed { root: String, reason: String },

    /// The files already on the partition exceed its size.
    #[error("partition overflow: {used} bytes used, partition holds {total}")]
    PartitionOverflow { used: u64, total: u64 },

    #[error("no such file: {path}")]
    NotFound { path: String },

    /// The path is outside the mount point or escapes it.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The path does not fit the fixed path buffer.
    #[error("path '{path}' is {len} bytes, limit is {max}")]
    PathTooLong { path: String, len: usize, max: usize },

    /// Every file slot is taken.
    #[error("too many open files (max {max})")]
    TooManyOpenFiles { max: usize },

    /// Failed to read a file or directory on the partition.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Maps an I/O error on `path`, keeping "not found" distinct.
    pub(crate) fn io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound {
                path: path.to_string(),
            }
        } else {
            StorageError::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}
