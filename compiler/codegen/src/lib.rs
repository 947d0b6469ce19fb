#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Code generation for scaffolded RPC service projects.
//!
//! This crate turns a [`ServiceDescription`] into the files of a runnable
//! service project. It focuses solely on rendering and writing files: the
//! directory layout is computed once by [`dir_context::build_dir_context`], and
//! every stage generator writes one category of output below it.
//!
//! Sequencing the stages, and deciding which optional ones run, belongs to the
//! pipeline crate.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use config::{Config, RunContext};
use exec::DynRunner;
use ir::ServiceDescription;
use thiserror::Error;

pub mod dir_context;
pub mod generators;
pub mod project_context;
pub mod utils;

pub use dir_context::{build_dir_context, Dir, DirContext, DirKind, ServiceDirs, ServiceName};
pub use project_context::ProjectContext;

/// Error type for code generation operations in this crate.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Underlying I/O error while reading or writing files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Formatting error when building generated source.
    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
    /// An external command run by a stage failed.
    #[error(transparent)]
    Exec(#[from] exec::ExecError),
    /// Generic message-based error.
    #[error("{0}")]
    Message(String),
}

impl From<String> for CodegenError {
    fn from(msg: String) -> Self { CodegenError::Message(msg) }
}

/// Convenient result type for codegen functions in this crate.
pub type Result<T> = std::result::Result<T, CodegenError>;

/// One category of generated output.
///
/// The declaration order is the order the pipeline runs the stages in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
    /// Deployment configuration (`etc/<service>.yaml`)
    Etc,
    /// Wire-format bindings via protoc
    Pb,
    /// Service config struct
    Config,
    /// Service-context wiring
    Svc,
    /// Per-method business logic stubs
    Logic,
    /// Per-service server adapters
    Server,
    /// Process entry point
    Main,
    /// Client-call helpers
    Call,
    /// Build automation file
    Makefile,
    /// Container build file
    Dockerfile,
}

impl StageKind {
    /// Every stage, in run order
    pub const ALL: [StageKind; 10] = [
        StageKind::Etc,
        StageKind::Pb,
        StageKind::Config,
        StageKind::Svc,
        StageKind::Logic,
        StageKind::Server,
        StageKind::Main,
        StageKind::Call,
        StageKind::Makefile,
        StageKind::Dockerfile,
    ];

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Etc => "etc",
            StageKind::Pb => "pb",
            StageKind::Config => "config",
            StageKind::Svc => "svc",
            StageKind::Logic => "logic",
            StageKind::Server => "server",
            StageKind::Main => "main",
            StageKind::Call => "call",
            StageKind::Makefile => "makefile",
            StageKind::Dockerfile => "dockerfile",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Generates one category of output files.
///
/// Implementors receive the computed layout, the parsed description, the
/// generator configuration and the run options, and write their files below
/// the directories named by the layout.
pub trait StageGenerator: Send + Sync {
    /// The stage this generator serves
    fn kind(&self) -> StageKind;

    /// Render and write this stage's files
    fn generate(
        &self,
        dir: &DirContext,
        proto: &ServiceDescription,
        cfg: &Config,
        ctx: &RunContext,
    ) -> Result<()>;
}

/// The generator registered for each stage.
pub struct StageGenerators {
    generators: BTreeMap<StageKind, Box<dyn StageGenerator>>,
}

impl StageGenerators {
    /// An empty set; every stage must be registered before use
    pub fn empty() -> Self { Self { generators: BTreeMap::new() } }

    /// The built-in generators; the pb stage runs protoc through `runner`
    pub fn defaults(runner: DynRunner) -> Self {
        use generators::*;

        Self::empty()
            .with(EtcGenerator)
            .with(PbGenerator::new(runner))
            .with(ConfigGenerator)
            .with(SvcGenerator)
            .with(LogicGenerator)
            .with(ServerGenerator)
            .with(MainGenerator)
            .with(CallGenerator)
            .with(MakefileGenerator)
            .with(DockerfileGenerator)
    }

    /// Register `generator`, replacing any generator for the same stage
    pub fn with<G: StageGenerator + 'static>(mut self, generator: G) -> Self {
        self.generators.insert(generator.kind(), Box::new(generator));
        self
    }

    /// Register a boxed generator, replacing any generator for the same stage
    pub fn insert(&mut self, generator: Box<dyn StageGenerator>) {
        self.generators.insert(generator.kind(), generator);
    }

    /// The generator for `kind`
    pub fn get(&self, kind: StageKind) -> Result<&dyn StageGenerator> {
        self.generators
            .get(&kind)
            .map(|g| g.as_ref())
            .ok_or_else(|| CodegenError::Message(format!("no generator registered for stage '{}'", kind)))
    }

    /// Stages without a registered generator
    pub fn missing(&self) -> Vec<StageKind> {
        StageKind::ALL.into_iter().filter(|k| !self.generators.contains_key(k)).collect()
    }
}

/// Trim trailing whitespace from each line and drop trailing blank lines.
/// Always ensures the returned string ends with a single newline when not empty.
fn clean_generated_source(src: &str) -> String {
    let mut lines: Vec<String> = src.lines().map(|l| l.trim_end().to_string()).collect();

    while matches!(lines.last(), Some(line) if line.is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        String::new()
    } else {
        format!("{}\n", lines.join("\n"))
    }
}

/// Persist a list of generated files under the given output directory,
/// creating any necessary subdirectories. Existing files are overwritten.
pub fn write_generated<P: AsRef<Path>>(
    out_dir: P,
    files: &[(String, String)],
) -> std::io::Result<()> {
    fs::create_dir_all(&out_dir)?;
    for (name, src) in files {
        let path = out_dir.as_ref().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, clean_generated_source(src).as_bytes())?;
        tracing::trace!(file = %path.display(), "wrote generated file");
    }
    Ok(())
}

/// Write `src` to `path` unless a file is already there.
///
/// Returns `true` when the file was written.
pub fn write_if_absent(path: &Path, src: &str) -> std::io::Result<bool> {
    if path::file_exists(path) {
        tracing::debug!(file = %path.display(), "keeping existing file");
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, clean_generated_source(src).as_bytes())?;
    Ok(true)
}
