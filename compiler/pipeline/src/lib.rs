#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! High-level pipeline that scaffolds a runnable RPC service project
//! from a protocol-definition file.
//!
//! ## Module Organization
//!
//! - `orchestration` - The [`Generator`] and its step sequence
//! - `stages` - The ordered stage plan and per-stage failure policy
//! - `ent` - ORM scaffolding run after the stages when requested
//! - `completion` - Observers told when a run has finished

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Convenient result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while running the generation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Resolving or creating a path failed.
    #[error("{}: {source}", path.display())]
    Fs {
        /// Path being resolved, created or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// An external command failed; carries its captured output.
    #[error(transparent)]
    Exec(#[from] exec::ExecError),
    /// The protocol source could not be parsed.
    #[error(transparent)]
    Parse(#[from] parser::ParseError),
    /// A stage generator failed.
    #[error(transparent)]
    Codegen(#[from] codegen::CodegenError),
    /// Configuration or run options are unusable.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// A required tool is not installed.
    #[error("required tool `{0}` was not found on PATH")]
    ToolNotFound(String),
    /// Generic message-based error.
    #[error("{0}")]
    Message(String),
}

impl PipelineError {
    pub(crate) fn fs(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| PipelineError::Fs { path: path.to_path_buf(), source }
    }
}

pub mod completion;
pub mod ent;
pub mod orchestration;
pub mod stages;

pub use completion::{CompletionObserver, ConsoleObserver};
pub use orchestration::{Generator, GeneratorBuilder};
pub use stages::{stage_plan, OnFailure, Stage};
