//! Service context wiring shared by every logic type.

use std::fmt::Write as _;

use config::{Config, RunContext};
use ir::ServiceDescription;

use super::write_imports;
use crate::{write_if_absent, DirContext, DirKind, Result, StageGenerator, StageKind};

/// Writes `internal/svc/servicecontext.go`
pub struct SvcGenerator;

impl StageGenerator for SvcGenerator {
    fn kind(&self) -> StageKind { StageKind::Svc }

    fn generate(
        &self,
        dir: &DirContext,
        _proto: &ServiceDescription,
        cfg: &Config,
        _ctx: &RunContext,
    ) -> Result<()> {
        let svc = dir.get(DirKind::Svc)?;
        let config_dir = dir.get(DirKind::Config)?;
        let file = svc.filename.join(format!("{}.go", cfg.naming.style.format("ServiceContext")));

        let mut code = String::new();
        writeln!(code, "package {}", svc.base)?;
        writeln!(code)?;
        write_imports(&mut code, &[], &[(None, config_dir.package.clone())], &[])?;
        writeln!(code, "type ServiceContext struct {{")?;
        writeln!(code, "\tConfig {}.Config", config_dir.base)?;
        writeln!(code, "}}")?;
        writeln!(code)?;
        writeln!(code, "func NewServiceContext(c {}.Config) *ServiceContext {{", config_dir.base)?;
        writeln!(code, "\treturn &ServiceContext{{")?;
        writeln!(code, "\t\tConfig: c,")?;
        writeln!(code, "\t}}")?;
        writeln!(code, "}}")?;

        write_if_absent(&file, &code)?;
        Ok(())
    }
}
