// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Arena size configuration and parsing.
//!
//! A [`ByteSize`] is the fixed capacity of a tensor arena. It supports
//! human-readable string parsing for config files and the CLI.

use crate::ArenaError;
use std::fmt;

/// A byte count with human-readable parsing and display.
///
/// # Parsing
/// Supports human-readable strings with binary suffixes:
/// - `"96K"` or `"96KB"` → 96 × 1024 bytes
/// - `"1M"` or `"1MB"` → 1 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
/// - `"8192"` or `"8192B"` → raw byte count
///
/// Zero is accepted: a zero-sized arena is valid, it just cannot hold any plan.
///
/// # Examples
/// ```
/// use tensor_arena::ByteSize;
///
/// let b = ByteSize::from_kb(96);
/// assert_eq!(b.as_bytes(), 98_304);
///
/// let b = ByteSize::parse("128K").unwrap();
/// assert_eq!(b.as_kb(), 128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ByteSize {
    bytes: usize,
}

impl ByteSize {
    /// Creates a size from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a size from kibibytes.
    pub fn from_kb(kb: usize) -> Self {
        Self { bytes: kb * KIB }
    }

    /// Creates a size from mebibytes.
    pub fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MIB }
    }

    /// Returns the size in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the size in kibibytes (truncated).
    pub fn as_kb(&self) -> usize {
        self.bytes / KIB
    }

    /// Parses a human-readable size string. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, ArenaError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ArenaError::InvalidSize("empty size string".into()));
        }

        let upper = s.to_ascii_uppercase();
        let (num_str, multiplier) = SUFFIXES
            .iter()
            .find(|(suffix, _)| upper.ends_with(suffix))
            .map_or((s, 1), |&(suffix, unit)| (&s[..s.len() - suffix.len()], unit));

        let value: usize = num_str.trim().parse().map_err(|_| {
            ArenaError::InvalidSize(format!(
                "'{s}': expected a number followed by an optional suffix (K, M, G)"
            ))
        })?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| ArenaError::InvalidSize(format!("'{s}' overflows usize")))?;

        Ok(Self { bytes })
    }
}

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;
const GIB: usize = 1024 * MIB;

/// Two-letter suffixes come first so `"KB"` is not read as `"K"` + `"B"`.
const SUFFIXES: [(&str, usize); 7] = [
    ("KB", KIB),
    ("MB", MIB),
    ("GB", GIB),
    ("K", KIB),
    ("M", MIB),
    ("G", GIB),
    ("B", 1),
];

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (unit, label) in [(GIB, "GB"), (MIB, "MB"), (KIB, "KB")] {
            if self.bytes >= unit && self.bytes % unit == 0 {
                return write!(f, "{} {label}", self.bytes / unit);
            }
        }
        write!(f, "{} B", self.bytes)
    }
}

impl std::str::FromStr for ByteSize {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kb() {
        let b = ByteSize::from_kb(96);
        assert_eq!(b.as_bytes(), 96 * 1024);
        assert_eq!(b.as_kb(), 96);
    }

    #[test]
    fn test_parse_kilobytes() {
        assert_eq!(ByteSize::parse("96K").unwrap().as_kb(), 96);
        assert_eq!(ByteSize::parse("96KB").unwrap().as_kb(), 96);
        assert_eq!(ByteSize::parse("96k").unwrap().as_kb(), 96);
        assert_eq!(ByteSize::parse("96kb").unwrap().as_kb(), 96);
    }

    #[test]
    fn test_parse_megabytes() {
        assert_eq!(ByteSize::parse("1M").unwrap().as_bytes(), 1024 * 1024);
        assert_eq!(ByteSize::parse("2MB").unwrap().as_kb(), 2048);
    }

    #[test]
    fn test_parse_raw_bytes() {
        assert_eq!(ByteSize::parse("4096").unwrap().as_bytes(), 4096);
        assert_eq!(ByteSize::parse("100B").unwrap().as_bytes(), 100);
    }

    #[test]
    fn test_parse_zero_allowed() {
        assert_eq!(ByteSize::parse("0").unwrap().as_bytes(), 0);
        assert_eq!(ByteSize::parse("0K").unwrap().as_bytes(), 0);
    }

    #[test]
    fn test_parse_with_whitespace() {
        assert_eq!(ByteSize::parse("  128K  ").unwrap().as_kb(), 128);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(ByteSize::parse("").is_err());
        assert!(ByteSize::parse("abc").is_err());
        assert!(ByteSize::parse("-1K").is_err());
        assert!("12Q".parse::<ByteSize>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ByteSize::from_mb(1)), "1 MB");
        assert_eq!(format!("{}", ByteSize::from_kb(96)), "96 KB");
        assert_eq!(format!("{}", ByteSize::from_bytes(100)), "100 B");
        assert_eq!(format!("{}", ByteSize::from_bytes(0)), "0 B");
    }

    #[test]
    fn test_serde_transparent() {
        let b = ByteSize::from_kb(2);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "2048");
        let back: ByteSize = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
