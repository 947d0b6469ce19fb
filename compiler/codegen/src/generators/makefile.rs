//! Build automation for the generated project.
//!
//! The `gen-rpc` target re-runs this tool against the project's own protocol
//! file; the ORM integration invokes it after regenerating the schema code.

use std::fmt::Write as _;

use config::{Config, RunContext};
use ir::ServiceDescription;

use crate::{write_if_absent, DirContext, DirKind, Result, StageGenerator, StageKind};

/// Writes `Makefile`
pub struct MakefileGenerator;

impl StageGenerator for MakefileGenerator {
    fn kind(&self) -> StageKind { StageKind::Makefile }

    fn generate(
        &self,
        dir: &DirContext,
        proto: &ServiceDescription,
        cfg: &Config,
        ctx: &RunContext,
    ) -> Result<()> {
        let main = dir.get(DirKind::Makefile)?;
        let service = dir.service_name();
        let service_file = cfg.naming.style.format(service.source());
        let src = proto.src.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

        let mut code = String::new();
        writeln!(code, "SERVICE={}", service.to_camel())?;
        writeln!(code, "SERVICE_FILE={}", service_file)?;
        writeln!(code, "PROJECT_STYLE={}", cfg.naming.style)?;
        writeln!(code)?;
        writeln!(code, "GO ?= go")?;
        writeln!(code, "GOFMT ?= gofmt \"-s\"")?;
        writeln!(code, "LDFLAGS := -s -w")?;
        writeln!(code)?;
        writeln!(code, ".PHONY: tidy")?;
        writeln!(code, "tidy: # Tidy the module dependencies")?;
        writeln!(code, "\t$(GO) mod tidy")?;
        writeln!(code)?;
        writeln!(code, ".PHONY: fmt")?;
        writeln!(code, "fmt: # Format the source files")?;
        writeln!(code, "\t$(GOFMT) -w .")?;
        writeln!(code)?;
        writeln!(code, ".PHONY: test")?;
        writeln!(code, "test: # Run the tests")?;
        writeln!(code, "\t$(GO) test -v ./...")?;
        writeln!(code)?;
        writeln!(code, ".PHONY: build")?;
        writeln!(code, "build: # Build the service binary")?;
        writeln!(
            code,
            "\t$(GO) build -ldflags \"$(LDFLAGS)\" -o $(SERVICE_FILE)_rpc $(SERVICE_FILE).go"
        )?;
        writeln!(code)?;
        writeln!(code, ".PHONY: gen-rpc")?;
        writeln!(code, "gen-rpc: # Regenerate the RPC code from {}", src)?;
        write!(code, "\trpcgen --src ./{} --output . --style $(PROJECT_STYLE)", src)?;
        if ctx.multiple {
            write!(code, " --multiple")?;
        }
        writeln!(code)?;
        if ctx.ent {
            writeln!(code)?;
            writeln!(code, ".PHONY: gen-ent")?;
            writeln!(code, "gen-ent: # Regenerate the ent code")?;
            writeln!(
                code,
                "\t$(GO) run -mod=mod entgo.io/ent/cmd/ent generate --template glob=\"./ent/template/*.tmpl\" ./ent/schema"
            )?;
        }
        writeln!(code)?;
        writeln!(code, ".PHONY: help")?;
        writeln!(code, "help: # Show the available targets")?;
        writeln!(
            code,
            "\t@grep -E '^[a-zA-Z_-]+:.*?# .*$$' $(MAKEFILE_LIST) | awk 'BEGIN {{FS = \":.*?# \"}}; {{printf \"%-12s %s\\n\", $$1, $$2}}'"
        )?;

        write_if_absent(&main.filename.join("Makefile"), &code)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::fixture;

    #[test]
    fn test_makefile_targets() {
        let mut f = fixture::greeter(false);
        f.ctx.ent = true;
        MakefileGenerator.generate(&f.dir, &f.proto, &f.cfg, &f.ctx).expect("makefile should generate");

        let makefile = fixture::read(f.temp.path().join("Makefile"));
        assert!(makefile.contains("SERVICE=Greeter\n"));
        assert!(makefile.contains("gen-rpc: # Regenerate the RPC code from greeter.proto\n"));
        assert!(makefile.contains("\trpcgen --src ./greeter.proto --output . --style $(PROJECT_STYLE)\n"));
        assert!(makefile.contains(".PHONY: gen-ent\n"));
    }

    #[test]
    fn test_makefile_without_ent() {
        let f = fixture::greeter(true);
        MakefileGenerator.generate(&f.dir, &f.proto, &f.cfg, &f.ctx).expect("makefile should generate");

        let makefile = fixture::read(f.temp.path().join("Makefile"));
        assert!(makefile.contains(" --multiple\n"));
        assert!(!makefile.contains("gen-ent"));
    }
}
