#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Logging setup for the scaffolding tools.
//!
//! Output goes to stderr so generated artifacts printed on stdout stay clean.
//! `RUST_LOG` takes precedence over the level passed to [`init`].

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber, filtering at `level` unless `RUST_LOG` is set.
///
/// Returns `false` when a subscriber was already installed.
pub fn init(level: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Like [`init`], but append plain-text log lines to `file` instead of stderr.
pub fn init_to_file(level: &str, file: &Path) -> std::io::Result<bool> {
    let file = OpenOptions::new().create(true).append(true).open(file)?;
    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let _ = init("debug");
        assert!(!init("info"));
        tracing::debug!("subscriber installed");
    }

    #[test]
    fn test_init_to_file_creates_file() {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let log = dir.path().join("rpcgen.log");
        // Another test may already own the global subscriber; the file is opened regardless
        let _ = init_to_file("debug", &log).expect("log file should open");
        assert!(log.is_file());
    }
}
