// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The mounted partition.

use crate::file::FileSlot;
use crate::partition::used_bytes;
use crate::{MountConfig, PartitionInfo, StorageError, StorageFile};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A regular file found by [`FlashStorage::read_dir`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DirEntry {
    /// File name without directory.
    pub name: String,
    /// Full virtual path, usable with [`FlashStorage::open`].
    pub path: String,
    pub len: u64,
}

/// A fixed-size flash partition backed by a host directory.
///
/// Every path handed to the partition is a *virtual* path under
/// [`MountConfig::base_path`] (e.g. `/spiffs/images/cat.bin`). Paths are
/// checked against the mount point, `..` traversal and the path-length
/// limit before touching the host filesystem.
#[derive(Debug)]
pub struct FlashStorage {
    config: MountConfig,
    open_files: Arc<AtomicUsize>,
}

impl FlashStorage {
    /// Mounts the partition described by `config`.
    ///
    /// A missing backing directory is created when
    /// `format_if_mount_failed` is set; otherwise the mount fails.
    pub fn mount(config: MountConfig) -> Result<Self, StorageError> {
        let root_display = config.root.display().to_string();
        if !config.base_path.starts_with('/') {
            return Err(StorageError::InvalidPath {
                path: config.base_path.clone(),
                reason: "mount point must be absolute".into(),
            });
        }

        if !config.root.exists() {
            if !config.format_if_mount_failed {
                return Err(StorageError::MountFailed {
                    root: root_display,
                    reason: "backing directory does not exist".into(),
                });
            }
            tracing::warn!(root = %root_display, "partition not found, formatting");
            std::fs::create_dir_all(&config.root).map_err(|e| StorageError::MountFailed {
                root: root_display.clone(),
                reason: format!("format failed: {e}"),
            })?;
        } else if !config.root.is_dir() {
            return Err(StorageError::MountFailed {
                root: root_display,
                reason: "backing path is not a directory".into(),
            });
        }

        let used = used_bytes(&config.root)?;
        if used > config.partition_size {
            return Err(StorageError::PartitionOverflow {
                used,
                total: config.partition_size,
            });
        }

        tracing::info!(
            base_path = %config.base_path,
            total = config.partition_size,
            used,
            "partition mounted"
        );
        Ok(Self {
            config,
            open_files: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn config(&self) -> &MountConfig {
        &self.config
    }

    /// Current capacity and usage.
    pub fn info(&self) -> Result<PartitionInfo, StorageError> {
        Ok(PartitionInfo {
            total_bytes: self.config.partition_size,
            used_bytes: used_bytes(&self.config.root)?,
        })
    }

    /// Number of handles currently open.
    pub fn open_files(&self) -> usize {
        self.open_files.load(Ordering::Acquire)
    }

    /// Opens a file for reading.
    pub fn open(&self, path: &str) -> Result<StorageFile, StorageError> {
        let host = self.resolve(path)?;
        let slot = FileSlot::acquire(&self.open_files, self.config.max_files)?;
        let file = std::fs::File::open(&host).map_err(|e| StorageError::io(path, e))?;
        let meta = file.metadata().map_err(|e| StorageError::io(path, e))?;
        if !meta.is_file() {
            return Err(StorageError::NotFound { path: path.into() });
        }
        tracing::trace!(path, len = meta.len(), "file opened");
        Ok(StorageFile::new(file, path.to_string(), meta.len(), slot))
    }

    /// Reads `path` into `buf`, returning the number of bytes read.
    ///
    /// Reads at most `buf.len()` bytes; a shorter file yields a short count.
    pub fn read_into(&self, path: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.open(path)?.read_fully(buf)
    }

    /// Reads the whole file.
    pub fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let mut file = self.open(path)?;
        let mut buf = vec![0u8; file.len() as usize];
        let n = file.read_fully(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Lists the regular files in `dir`, sorted by name.
    pub fn read_dir(&self, dir: &str) -> Result<Vec<DirEntry>, StorageError> {
        let host = self.resolve(dir)?;
        let prefix = dir.trim_end_matches('/');
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&host).map_err(|e| StorageError::io(dir, e))? {
            let entry = entry.map_err(|e| StorageError::io(dir, e))?;
            let meta = entry.metadata().map_err(|e| StorageError::io(dir, e))?;
            if !meta.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(DirEntry {
                path: format!("{prefix}/{name}"),
                name,
                len: meta.len(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!(dir, files = entries.len(), "directory listed");
        Ok(entries)
    }

    /// Maps a virtual path to its host path.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let max = self.config.max_path_len;
        if path.len() > max {
            return Err(StorageError::PathTooLong {
                path: path.into(),
                len: path.len(),
                max,
            });
        }

        let base = self.config.base_path.trim_end_matches('/');
        let rest = match path.strip_prefix(base) {
            Some("") => "",
            Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
            _ => {
                return Err(StorageError::InvalidPath {
                    path: path.into(),
                    reason: format!("not under mount point {}", self.config.base_path),
                })
            }
        };

        let mut host = self.config.root.clone();
        for component in Path::new(rest).components() {
            match component {
                Component::Normal(part) => host.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(StorageError::InvalidPath {
                        path: path.into(),
                        reason: "path escapes the partition".into(),
                    })
                }
            }
        }
        Ok(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn mounted(dir: &tempfile::TempDir) -> FlashStorage {
        FlashStorage::mount(MountConfig::with_root(dir.path())).unwrap()
    }

    #[test]
    fn test_mount_formats_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("part");
        let storage = FlashStorage::mount(MountConfig::with_root(&root)).unwrap();
        assert!(root.is_dir());
        assert_eq!(storage.info().unwrap().used_bytes, 0);
    }

    #[test]
    fn test_mount_fails_without_format() {
        let dir = tempfile::tempdir().unwrap();
        let config = MountConfig {
            format_if_mount_failed: false,
            ..MountConfig::with_root(dir.path().join("missing"))
        };
        assert!(matches!(
            FlashStorage::mount(config),
            Err(StorageError::MountFailed { .. })
        ));
    }

    #[test]
    fn test_mount_overflow() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big"), vec![0u8; 2048]).unwrap();
        let config = MountConfig {
            partition_size: 1024,
            ..MountConfig::with_root(dir.path())
        };
        assert!(matches!(
            FlashStorage::mount(config),
            Err(StorageError::PartitionOverflow {
                used: 2048,
                total: 1024
            })
        ));
    }

    #[test]
    fn test_resolve_rules() {
        let dir = tempfile::tempdir().unwrap();
        let s = mounted(&dir);
        assert_eq!(s.resolve("/spiffs/a.bin").unwrap(), dir.path().join("a.bin"));
        assert_eq!(s.resolve("/spiffs").unwrap(), dir.path().to_path_buf());
        assert!(matches!(
            s.resolve("/spiffsx/a.bin"),
            Err(StorageError::InvalidPath { .. })
        ));
        assert!(matches!(
            s.resolve("/data/a.bin"),
            Err(StorageError::InvalidPath { .. })
        ));
        assert!(matches!(
            s.resolve("/spiffs/../etc/passwd"),
            Err(StorageError::InvalidPath { .. })
        ));
        let long = format!("/spiffs/{}", "x".repeat(60));
        assert!(matches!(
            s.resolve(&long),
            Err(StorageError::PathTooLong { max: 64, .. })
        ));
    }

    #[test]
    fn test_read_dir_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.bin"), [1u8; 3]).unwrap();
        std::fs::write(dir.path().join("a.bin"), [1u8; 2]).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let s = mounted(&dir);

        let entries = s.read_dir("/spiffs").unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.bin", "b.bin"]);
        assert_eq!(entries[0].path, "/spiffs/a.bin");
        assert_eq!(entries[1].len, 3);
    }

    #[test]
    fn test_read_into_and_open_limit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("img.bin"), [7u8; 10]).unwrap();
        let s = FlashStorage::mount(MountConfig {
            max_files: 1,
            ..MountConfig::with_root(dir.path())
        })
        .unwrap();

        let mut buf = [0u8; 16];
        assert_eq!(s.read_into("/spiffs/img.bin", &mut buf).unwrap(), 10);
        assert_eq!(&buf[..10], &[7u8; 10]);
        assert_eq!(s.open_files(), 0);

        let mut held = s.open("/spiffs/img.bin").unwrap();
        assert_eq!(held.len(), 10);
        assert!(matches!(
            s.open("/spiffs/img.bin"),
            Err(StorageError::TooManyOpenFiles { max: 1 })
        ));
        let mut first = [0u8; 4];
        held.read_exact(&mut first).unwrap();
        drop(held);
        assert!(s.open("/spiffs/img.bin").is_ok());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let s = mounted(&dir);
        assert!(matches!(
            s.open("/spiffs/nope.bin"),
            Err(StorageError::NotFound { .. })
        ));
        assert_eq!(s.open_files(), 0);
    }
}
