// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # flash-storage
//!
//! A fixed-size flash partition (SPIFFS-style) mounted over a host
//! directory.
//!
//! # Semantics
//! - **Mount** checks the backing directory, formats it if allowed, and
//!   refuses a partition whose contents exceed its size.
//! - **Paths** are virtual, under the mount point, and limited to the
//!   firmware's path buffer length.
//! - **Files** are opened read-only; at most `max_files` handles exist at
//!   once and each releases its slot on drop.
//!
//! # Example
//! ```no_run
//! use flash_storage::{FlashStorage, MountConfig};
//!
//! let storage = FlashStorage::mount(MountConfig::default())?;
//! println!("{}", storage.info()?.summary());
//! for entry in storage.read_dir("/spiffs/images")? {
//!     println!("{} ({} bytes)", entry.path, entry.len);
//! }
//! # Ok::<(), flash_storage::StorageError>(())
//! ```

mod config;
mod error;
mod file;
mod partition;
mod storage;

pub use config::MountConfig;
pub use error::StorageError;
pub use file::StorageFile;
pub use partition::PartitionInfo;
pub use storage::{DirEntry, FlashStorage};
