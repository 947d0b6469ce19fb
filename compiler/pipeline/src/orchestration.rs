//! Pipeline orchestration for the main entry point.
//!
//! [`Generator::generate`] runs one scaffolding job from start to finish:
//!
//! 1. resolve and create the output directory
//! 2. check the toolchain ([`Generator::prepare`])
//! 3. `go mod init` when a module name is given
//! 4. version migration when both versions are given
//! 5. parse the protocol source
//! 6. compute the directory layout
//! 7. run the stage plan
//! 8. ORM scaffolding when requested
//! 9. notify the completion observers
//!
//! Every step aborts the run on failure, except the call stage which by
//! default records its error and lets the build-file stages run first.
//! Files written before an abort stay on disk.

use std::sync::Arc;

use codegen::{build_dir_context, DirKind, ProjectContext, StageGenerators};
use config::{Config, RunContext};
use exec::{CommandRunner, DynRunner, ShellRunner};
use parser::{DefaultProtoParser, ProtoParser};

use crate::completion::CompletionObserver;
use crate::stages::{stage_plan, OnFailure, Stage};
use crate::{ent, PipelineError, Result};

/// Tools [`Generator::prepare`] requires on `PATH`
pub const REQUIRED_TOOLS: [&str; 2] = ["go", "protoc"];

/// Module initialisation command
pub fn mod_init_command(module: &str) -> String { format!("go mod init {}", module) }

/// Version migration command
pub fn migrate_command(go_zero_version: &str, tool_version: &str) -> String {
    format!("goctls migrate --zero-version {} --tool-version {}", go_zero_version, tool_version)
}

/// Scaffolds service projects from protocol sources
pub struct Generator {
    config: Config,
    runner: DynRunner,
    parser: Arc<dyn ProtoParser>,
    stages: StageGenerators,
    observers: Vec<Arc<dyn CompletionObserver>>,
}

impl Generator {
    /// A generator with the shell runner, the default parser and the built-in stages
    pub fn new(config: Config) -> Result<Self> { Self::builder().config(config).build() }

    /// Create a new builder for Generator
    pub fn builder() -> GeneratorBuilder { GeneratorBuilder::default() }

    /// The generator configuration
    pub fn config(&self) -> &Config { &self.config }

    /// The stages this generator runs, in order
    pub fn stage_plan(&self) -> Vec<Stage> { stage_plan(self.config.generation.strict_call_stage) }

    /// Check that the generator can run: valid configuration and, unless
    /// disabled, the external tools on `PATH`
    pub fn prepare(&self) -> Result<()> {
        self.config.validate()?;
        if !self.config.generation.check_toolchain {
            tracing::debug!("toolchain check disabled");
            return Ok(());
        }
        for tool in REQUIRED_TOOLS {
            let found = which::which(tool).map_err(|_| PipelineError::ToolNotFound(tool.to_string()))?;
            tracing::debug!(tool, path = %found.display(), "found tool");
        }
        Ok(())
    }

    /// Generate the project described by `ctx`
    ///
    /// # Returns
    ///
    /// Returns the first error that aborted the run, or the deferred call-stage
    /// error when nothing aborted.
    pub fn generate(&self, ctx: &RunContext) -> Result<()> {
        ctx.validate()?;

        let abs = path::absolute(&ctx.output).map_err(PipelineError::fs(&ctx.output))?;
        path::mkdir_if_not_exist(&abs).map_err(PipelineError::fs(&abs))?;
        tracing::info!(src = %ctx.src.display(), output = %abs.display(), "generating rpc project");

        self.prepare()?;

        if let Some(module) = ctx.module_to_init() {
            self.runner.run(&mod_init_command(module), &abs)?;
        }

        match ctx.migration_versions() {
            Some((go_zero, tool)) => {
                self.runner.run(&migrate_command(go_zero, tool), &abs)?;
            }
            None if !ctx.go_zero_version.is_empty() || !ctx.tool_version.is_empty() => {
                tracing::debug!("only one migration version given, skipping migration");
            }
            None => {}
        }

        let project = ProjectContext::prepare(&abs, &ctx.module_name)?;
        let proto = self.parser.parse(&ctx.src, ctx.multiple)?;
        let dir = build_dir_context(&project, &proto, &self.config, ctx)?;

        let mut deferred: Option<PipelineError> = None;
        for stage in self.stage_plan() {
            if !stage.applies(ctx) {
                tracing::debug!(stage = %stage.kind, "stage not requested, skipping");
                continue;
            }
            tracing::info!(stage = %stage.kind, "generating");

            let generator = self.stages.get(stage.kind)?;
            match (generator.generate(&dir, &proto, &self.config, ctx), stage.on_failure) {
                (Ok(()), _) => {}
                (Err(err), OnFailure::Abort) => return Err(err.into()),
                (Err(err), OnFailure::Defer) => {
                    tracing::warn!(stage = %stage.kind, error = %err, "stage failed, continuing");
                    deferred = Some(err.into());
                }
            }
        }

        if ctx.ent {
            ent::scaffold(self.runner.as_ref(), &abs, dir.get(DirKind::Ent)?, dir.service_name())?;
        }

        if let Some(err) = deferred {
            return Err(err);
        }
        for observer in &self.observers {
            observer.on_complete(&abs);
        }
        Ok(())
    }
}

/// Builder for Generator
#[derive(Default)]
pub struct GeneratorBuilder {
    config: Option<Config>,
    runner: Option<DynRunner>,
    parser: Option<Arc<dyn ProtoParser>>,
    stages: Option<StageGenerators>,
    observers: Vec<Arc<dyn CompletionObserver>>,
}

impl GeneratorBuilder {
    /// Set the configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the command runner used for every external command
    pub fn runner(mut self, runner: DynRunner) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Set the protocol parser
    pub fn parser(mut self, parser: Arc<dyn ProtoParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Set the stage generators (defaults to the built-in set)
    pub fn stages(mut self, stages: StageGenerators) -> Self {
        self.stages = Some(stages);
        self
    }

    /// Register a completion observer
    pub fn observer(mut self, observer: Arc<dyn CompletionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the Generator
    ///
    /// Fails when the configuration is invalid or a stage has no generator.
    pub fn build(self) -> Result<Generator> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let runner = self.runner.unwrap_or_else(|| Arc::new(ShellRunner));
        let stages = self.stages.unwrap_or_else(|| StageGenerators::defaults(runner.clone()));
        let missing = stages.missing();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|k| k.as_str()).collect();
            return Err(PipelineError::Message(format!(
                "no generator registered for stages: {}",
                names.join(", ")
            )));
        }

        Ok(Generator {
            config,
            runner,
            parser: self.parser.unwrap_or_else(|| Arc::new(DefaultProtoParser::new())),
            stages,
            observers: self.observers,
        })
    }
}
