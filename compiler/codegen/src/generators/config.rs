//! Service configuration struct.

use std::fmt::Write as _;

use config::{Config, RunContext};
use ir::ServiceDescription;

use super::write_imports;
use crate::{write_if_absent, DirContext, DirKind, Result, StageGenerator, StageKind};

/// Writes `internal/config/config.go`
pub struct ConfigGenerator;

impl StageGenerator for ConfigGenerator {
    fn kind(&self) -> StageKind { StageKind::Config }

    fn generate(
        &self,
        dir: &DirContext,
        _proto: &ServiceDescription,
        cfg: &Config,
        _ctx: &RunContext,
    ) -> Result<()> {
        let config_dir = dir.get(DirKind::Config)?;
        let file = config_dir.filename.join(format!("{}.go", cfg.naming.style.format("config")));

        let mut code = String::new();
        writeln!(code, "package {}", config_dir.base)?;
        writeln!(code)?;
        write_imports(&mut code, &[], &[], &["github.com/zeromicro/go-zero/zrpc"])?;
        writeln!(code, "type Config struct {{")?;
        writeln!(code, "\tzrpc.RpcServerConf")?;
        writeln!(code, "}}")?;

        write_if_absent(&file, &code)?;
        Ok(())
    }
}
