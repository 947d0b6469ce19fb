//! Deployment configuration file.

use std::fmt::Write as _;

use config::{Config, RunContext};
use ir::ServiceDescription;

use crate::{write_if_absent, DirContext, DirKind, Result, StageGenerator, StageKind};

/// Writes `etc/<service>.yaml` with the listen address and registry key
pub struct EtcGenerator;

impl StageGenerator for EtcGenerator {
    fn kind(&self) -> StageKind { StageKind::Etc }

    fn generate(
        &self,
        dir: &DirContext,
        _proto: &ServiceDescription,
        cfg: &Config,
        ctx: &RunContext,
    ) -> Result<()> {
        let etc = dir.get(DirKind::Etc)?;
        let service = dir.service_name().source();
        let file = etc.filename.join(format!("{}.yaml", cfg.naming.style.format(service)));

        let mut code = String::new();
        writeln!(code, "Name: {}.rpc", service)?;
        writeln!(code, "ListenOn: 0.0.0.0:{}", ctx.port)?;
        writeln!(code, "Etcd:")?;
        writeln!(code, "  Hosts:")?;
        writeln!(code, "  - 127.0.0.1:2379")?;
        writeln!(code, "  Key: {}.rpc", service)?;

        write_if_absent(&file, &code)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::fixture;

    #[test]
    fn test_etc_yaml() {
        let f = fixture::greeter(false);
        EtcGenerator.generate(&f.dir, &f.proto, &f.cfg, &f.ctx).expect("etc should generate");

        let yaml = fixture::read(f.temp.path().join("etc").join("greeter.yaml"));
        assert!(yaml.contains("Name: greeter.rpc"));
        assert!(yaml.contains("ListenOn: 0.0.0.0:9090"));
    }
}
