use config::{Config, RunContext};
use exec::DynRunner;
use ir::ServiceDescription;

use crate::{DirContext, Result, StageGenerator, StageKind};

/// Produces the wire-format bindings by running protoc
///
/// The command comes from [`RunContext::protoc_command`] and runs in the
/// current working directory, since the paths it carries are relative to where
/// the tool was invoked. Without a command the stage is skipped.
pub struct PbGenerator {
    runner: DynRunner,
}

impl PbGenerator {
    /// Create a generator that runs protoc through `runner`
    pub fn new(runner: DynRunner) -> Self { Self { runner } }
}

impl StageGenerator for PbGenerator {
    fn kind(&self) -> StageKind { StageKind::Pb }

    fn generate(
        &self,
        _dir: &DirContext,
        _proto: &ServiceDescription,
        _cfg: &Config,
        ctx: &RunContext,
    ) -> Result<()> {
        let Some(command) = ctx.protoc_command() else {
            tracing::debug!("no protoc command configured, skipping bindings");
            return Ok(());
        };

        for out in [&ctx.proto_gen_go_dir, &ctx.proto_gen_grpc_dir, &ctx.go_output, &ctx.grpc_output] {
            if !out.as_os_str().is_empty() {
                path::mkdir_if_not_exist(out)?;
            }
        }

        let cwd = std::env::current_dir()?;
        tracing::debug!(google_plugin = ctx.is_google_plugin, "generating bindings");
        let output = self.runner.run(&command, &cwd)?;
        if !output.trim().is_empty() {
            tracing::debug!(output = %output.trim_end(), "protoc output");
        }
        Ok(())
    }
}
