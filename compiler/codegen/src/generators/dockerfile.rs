//! Container image build for the generated service.

use std::fmt::Write as _;

use config::{Config, RunContext};
use ir::ServiceDescription;

use crate::{write_if_absent, DirContext, DirKind, Result, StageGenerator, StageKind};

const BUILDER_IMAGE: &str = "golang:1.22-alpine";
const RUNTIME_IMAGE: &str = "alpine:3.19";

/// Writes a two-stage `Dockerfile` that builds the service binary
pub struct DockerfileGenerator;

impl StageGenerator for DockerfileGenerator {
    fn kind(&self) -> StageKind { StageKind::Dockerfile }

    fn generate(
        &self,
        dir: &DirContext,
        _proto: &ServiceDescription,
        cfg: &Config,
        ctx: &RunContext,
    ) -> Result<()> {
        let main = dir.get(DirKind::Dockerfile)?;
        let service_file = cfg.naming.style.format(dir.service_name().source());
        let binary = format!("{}_rpc", service_file);

        let mut code = String::new();
        writeln!(code, "FROM {} AS builder", BUILDER_IMAGE)?;
        writeln!(code)?;
        writeln!(code, "WORKDIR /build")?;
        writeln!(code, "ENV CGO_ENABLED=0")?;
        writeln!(code)?;
        writeln!(code, "COPY go.mod go.sum ./")?;
        writeln!(code, "RUN go mod download")?;
        writeln!(code, "COPY . .")?;
        writeln!(code, "RUN go build -ldflags=\"-s -w\" -o /app/{} {}.go", binary, service_file)?;
        writeln!(code)?;
        writeln!(code, "FROM {}", RUNTIME_IMAGE)?;
        writeln!(code)?;
        writeln!(code, "WORKDIR /app")?;
        writeln!(code, "COPY --from=builder /app/{} ./", binary)?;
        writeln!(code, "COPY --from=builder /build/etc/{}.yaml ./etc/", service_file)?;
        writeln!(code)?;
        writeln!(code, "EXPOSE {}", ctx.port)?;
        writeln!(code)?;
        writeln!(code, "ENTRYPOINT [\"./{}\", \"-f\", \"etc/{}.yaml\"]", binary, service_file)?;

        write_if_absent(&main.filename.join("Dockerfile"), &code)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::fixture;

    #[test]
    fn test_dockerfile() {
        let f = fixture::greeter(false);
        DockerfileGenerator.generate(&f.dir, &f.proto, &f.cfg, &f.ctx).expect("dockerfile should generate");

        let dockerfile = fixture::read(f.temp.path().join("Dockerfile"));
        assert!(dockerfile.starts_with("FROM golang:1.22-alpine AS builder\n"));
        assert!(dockerfile.contains("EXPOSE 9090\n"));
        assert!(dockerfile.contains("ENTRYPOINT [\"./greeter_rpc\", \"-f\", \"etc/greeter.yaml\"]"));
    }
}
