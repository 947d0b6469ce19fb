#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
//! Command-line front end for the rpcgen scaffolding pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use config::{Config, NamingStyle, RunContext};
use pipeline::{ConsoleObserver, Generator};
use thiserror::Error;

/// Errors that can occur during an rpcgen invocation.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or the options are invalid.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Generation failed.
    #[error(transparent)]
    Pipeline(#[from] pipeline::PipelineError),
    /// The log file could not be opened.
    #[error("failed to open log file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rpcgen operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Scaffold a runnable RPC service project from a protocol definition
#[derive(Parser, Debug, Clone)]
#[command(name = "rpcgen", version, about)]
pub struct Args {
    /// Protocol definition source file
    #[arg(long)]
    pub src: PathBuf,

    /// Full protoc command line for the wire-format bindings
    #[arg(long, default_value = "")]
    pub protoc_cmd: String,

    /// Output directory for message bindings (builds a protoc command when --protoc-cmd is empty)
    #[arg(long)]
    pub go_out: Option<PathBuf>,

    /// Output directory for grpc bindings; implies --google-plugin and must match --go-out
    #[arg(long)]
    pub grpc_out: Option<PathBuf>,

    /// Use the split protoc-gen-go and protoc-gen-go-grpc plugins instead of `plugins=grpc`
    #[arg(long)]
    pub google_plugin: bool,

    /// Project output directory
    #[arg(long, short = 'o', default_value = ".")]
    pub output: PathBuf,

    /// Allow several services and follow imports
    #[arg(long, short = 'm')]
    pub multiple: bool,

    /// Scaffold the ent ORM schema after generating
    #[arg(long)]
    pub ent: bool,

    /// Ent schema directory
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// Module path to initialise with `go mod init`
    #[arg(long, default_value = "")]
    pub module_name: String,

    /// go-zero version to migrate to (needs --tool-version)
    #[arg(long, default_value = "")]
    pub go_zero_version: String,

    /// Tool version to migrate to (needs --go-zero-version)
    #[arg(long, default_value = "")]
    pub tool_version: String,

    /// Port the service listens on
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Generate a Makefile
    #[arg(long)]
    pub makefile: bool,

    /// Generate a Dockerfile
    #[arg(long)]
    pub dockerfile: bool,

    /// Configuration file (defaults to the user config path when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// File naming style: gozero, go_zero or goZero
    #[arg(long)]
    pub style: Option<NamingStyle>,

    /// Skip checking for protoc and go on PATH
    #[arg(long)]
    pub no_toolchain_check: bool,

    /// Log at debug level
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Args {
    /// The configuration with command-line overrides applied
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(style) = self.style {
            config.naming.style = style;
        }
        if self.no_toolchain_check {
            config.generation.check_toolchain = false;
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        Ok(config)
    }

    /// The run options these arguments describe
    pub fn run_context(&self) -> Result<RunContext> {
        let go_out = self.go_out.clone().unwrap_or_default();
        let grpc_out = self.grpc_out.clone().unwrap_or_default();
        let grpc_dir = self.grpc_out.clone().unwrap_or_else(|| go_out.clone());

        let ctx = RunContext::builder()
            .src(self.src.clone())
            .protoc_cmd(self.protoc_cmd.clone())
            .proto_gen_dirs(go_out.clone(), grpc_dir)
            .protoc_outputs(go_out, grpc_out)
            .google_plugin(self.google_plugin || self.grpc_out.is_some())
            .output(self.output.clone())
            .multiple(self.multiple)
            .ent(self.ent, self.schema.clone().unwrap_or_default())
            .module_name(self.module_name.clone())
            .versions(self.go_zero_version.clone(), self.tool_version.clone())
            .port(self.port)
            .make_file(self.makefile)
            .docker_file(self.dockerfile)
            .build()?;
        Ok(ctx)
    }
}

/// Run one generation for `args`, printing `Done.` on success
pub fn run(args: &Args) -> Result<()> {
    let config = args.load_config()?;
    match &config.logging.file {
        Some(file) => {
            logging::init_to_file(&config.logging.level, file)?;
        }
        None => {
            logging::init(&config.logging.level);
        }
    }

    let ctx = args.run_context()?;
    tracing::debug!(?ctx, "run context");

    let generator = Generator::builder().config(config).observer(Arc::new(ConsoleObserver)).build()?;
    generator.generate(&ctx)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_context_from_flags() {
        let args = Args::try_parse_from([
            "rpcgen",
            "--src",
            "greeter.proto",
            "--output",
            "out",
            "--module-name",
            "example.com/greeter",
            "--go-zero-version",
            "v1.6.0",
            "--port",
            "9000",
            "--makefile",
            "--ent",
        ])
        .expect("flags should parse");

        let ctx = args.run_context().expect("context should build");
        assert_eq!(ctx.src, PathBuf::from("greeter.proto"));
        assert_eq!(ctx.module_to_init(), Some("example.com/greeter"));
        assert!(ctx.migration_versions().is_none());
        assert_eq!(ctx.port, 9000);
        assert!(ctx.make_file && ctx.ent && !ctx.docker_file);
        assert!(ctx.protoc_command().is_none());
        assert_eq!(ctx.schema, PathBuf::new());
    }

    #[test]
    fn test_minimal_flags_parse() {
        let args = Args::try_parse_from(["rpcgen", "--src", "greeter.proto"]).expect("flags should parse");
        assert!(args.schema.is_none());

        let ctx = args.run_context().expect("context should build");
        assert_eq!(ctx.output, PathBuf::from("."));
        assert_eq!(ctx.port, 8080);

        let args = Args::try_parse_from(["rpcgen", "--src", "greeter.proto", "--ent", "--schema", "ent/schema"])
            .expect("flags should parse");
        assert_eq!(args.run_context().expect("context should build").schema, PathBuf::from("ent/schema"));
    }

    #[test]
    fn test_protoc_command_from_outputs() {
        let args = Args::try_parse_from(["rpcgen", "--src", "greeter.proto", "--go-out", "./types"])
            .expect("flags should parse");
        let ctx = args.run_context().expect("context should build");
        assert!(!ctx.is_google_plugin);
        assert_eq!(ctx.protoc_command().as_deref(), Some("protoc greeter.proto --go_out=plugins=grpc:./types"));
        assert_eq!(ctx.proto_gen_grpc_dir, PathBuf::from("./types"));

        let args = Args::try_parse_from([
            "rpcgen",
            "--src",
            "greeter.proto",
            "--go-out",
            "./types",
            "--grpc-out",
            "./types",
        ])
        .expect("flags should parse");
        let ctx = args.run_context().expect("context should build");
        assert!(ctx.is_google_plugin);
        assert_eq!(
            ctx.protoc_command().as_deref(),
            Some("protoc greeter.proto --go_out=./types --go-grpc_out=./types")
        );
    }

    #[test]
    fn test_mismatched_plugin_outputs_rejected() {
        let args = Args::try_parse_from([
            "rpcgen",
            "--src",
            "greeter.proto",
            "--go-out",
            "./types",
            "--grpc-out",
            "./grpc",
        ])
        .expect("flags should parse");
        assert!(matches!(args.run_context(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_style_flag() {
        let args = Args::try_parse_from(["rpcgen", "--src", "a.proto", "--style", "go_zero"])
            .expect("flags should parse");
        assert_eq!(args.style, Some(NamingStyle::Snake));

        assert!(Args::try_parse_from(["rpcgen", "--src", "a.proto", "--style", "GoZero"]).is_err());
    }

    #[test]
    fn test_zero_port_rejected() {
        let args = Args::try_parse_from(["rpcgen", "--src", "a.proto", "--port", "0"])
            .expect("flags should parse");
        assert!(matches!(args.run_context(), Err(CliError::Config(_))));
    }
}
