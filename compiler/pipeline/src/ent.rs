//! ORM scaffolding with the ent toolchain.
//!
//! Runs after every stage when requested: initialise a schema named after the
//! service, tidy the module, generate the ORM code, install the pagination
//! template, then regenerate the RPC code through `make gen-rpc`.

use std::fs::OpenOptions;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use codegen::{Dir, ServiceName};
use exec::CommandRunner;

use crate::{PipelineError, Result};

/// ent code template adding `Page` queries to every entity
pub const PAGINATION_TPL: &str = include_str!("../templates/pagination.tmpl");

/// Schema directory handed to the code generator
pub const SCHEMA_DIR: &str = "./ent/schema";

/// Dependency tidy command
pub const TIDY_COMMAND: &str = "go mod tidy";

/// Project build target that regenerates the RPC code
pub const GEN_RPC_COMMAND: &str = "make gen-rpc";

const ENT_CMD: &str = "go run -mod=mod entgo.io/ent/cmd/ent";

/// Schema initialisation command for the PascalCase service name
pub fn init_command(service_camel: &str) -> String { format!("{} init {}", ENT_CMD, service_camel) }

/// ORM code generation command
pub fn generate_command() -> String { format!("{} generate {}", ENT_CMD, SCHEMA_DIR) }

/// Where the pagination template lives below the ORM root `ent_dir`
pub fn pagination_template_path(ent_dir: &Path) -> PathBuf { ent_dir.join("template").join("pagination.tmpl") }

/// Run the full ORM integration in the project at `abs`
///
/// Commands run in `abs`; the pagination template goes below `ent`. Each step
/// aborts the sequence on failure. The template is only written when absent.
pub fn scaffold(runner: &dyn CommandRunner, abs: &Path, ent: &Dir, service: &ServiceName) -> Result<()> {
    tracing::info!(service = %service.to_camel(), "scaffolding ent schema");

    runner.run(&init_command(&service.to_camel()), abs)?;
    runner.run(TIDY_COMMAND, abs)?;
    runner.run(&generate_command(), abs)?;

    let template = pagination_template_path(&ent.filename);
    if let Some(template_dir) = template.parent() {
        path::mkdir_if_not_exist(template_dir).map_err(PipelineError::fs(template_dir))?;
    }
    write_pagination_template(&template)?;

    runner.run(GEN_RPC_COMMAND, abs)?;
    Ok(())
}

/// Write [`PAGINATION_TPL`] to `path` unless something already sits there
///
/// Any existing entry counts, including a directory or a dangling symlink.
/// Returns `true` when the file was written. New files are fully permissive
/// (`0o777` before the umask) on unix.
pub fn write_pagination_template(path: &Path) -> Result<bool> {
    if path.exists() || path.symlink_metadata().is_ok() {
        tracing::debug!(file = %path.display(), "pagination template path taken, leaving it untouched");
        return Ok(false);
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o777);

    let mut file = options.open(path).map_err(PipelineError::fs(path))?;
    file.write_all(PAGINATION_TPL.as_bytes()).map_err(PipelineError::fs(path))?;
    Ok(true)
}
