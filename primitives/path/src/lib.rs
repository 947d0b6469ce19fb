// SPDX-License-Identifier: CC0-1.0

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Path utility functions for preparing output trees.
//!
//! This module provides utilities for resolving absolute paths, creating
//! directories on demand, and locating the Go module that owns a directory.

pub mod path_utils;

// Re-export for convenience
pub use path_utils::*;
