//! Process entry point.

use std::fmt::Write as _;

use config::{Config, RunContext};
use ir::ServiceDescription;

use super::{write_imports, GoImport};
use crate::utils::go_camel;
use crate::{write_if_absent, DirContext, DirKind, Result, StageGenerator, StageKind};

/// Writes `<service>.go`, which loads the config and registers every server
pub struct MainGenerator;

impl StageGenerator for MainGenerator {
    fn kind(&self) -> StageKind { StageKind::Main }

    fn generate(
        &self,
        dir: &DirContext,
        proto: &ServiceDescription,
        cfg: &Config,
        _ctx: &RunContext,
    ) -> Result<()> {
        let main = dir.get(DirKind::Main)?;
        let pb = dir.get(DirKind::Pb)?;
        let svc = dir.get(DirKind::Svc)?;
        let config_dir = dir.get(DirKind::Config)?;
        let service_file = cfg.naming.style.format(dir.service_name().source());

        let mut project: Vec<GoImport> = vec![(None, config_dir.package.clone()), (None, pb.package.clone())];
        let mut registrations = Vec::new();
        for service in &proto.services {
            let Some(dirs) = dir.service(&service.name) else { continue };
            let server_pkg = if dir.is_multiple() {
                let alias = format!("{}server", dirs.server.base);
                project.push((Some(alias.clone()), dirs.server.package.clone()));
                alias
            } else {
                if registrations.is_empty() {
                    project.push((None, dirs.server.package.clone()));
                }
                dirs.server.base.clone()
            };
            let service_type = go_camel(&service.name);
            registrations.push(format!(
                "\t\t{}.Register{1}Server(grpcServer, {2}.New{1}Server(ctx))",
                pb.base, service_type, server_pkg
            ));
        }
        project.push((None, svc.package.clone()));

        let mut code = String::new();
        writeln!(code, "package main")?;
        writeln!(code)?;
        write_imports(
            &mut code,
            &["flag", "fmt"],
            &project,
            &[
                "github.com/zeromicro/go-zero/core/conf",
                "github.com/zeromicro/go-zero/core/service",
                "github.com/zeromicro/go-zero/zrpc",
                "google.golang.org/grpc",
                "google.golang.org/grpc/reflection",
            ],
        )?;
        writeln!(
            code,
            "var configFile = flag.String(\"f\", \"etc/{}.yaml\", \"the config file\")",
            service_file
        )?;
        writeln!(code)?;
        writeln!(code, "func main() {{")?;
        writeln!(code, "\tflag.Parse()")?;
        writeln!(code)?;
        writeln!(code, "\tvar c config.Config")?;
        writeln!(code, "\tconf.MustLoad(*configFile, &c)")?;
        writeln!(code, "\tctx := svc.NewServiceContext(c)")?;
        writeln!(code)?;
        writeln!(code, "\ts := zrpc.MustNewServer(c.RpcServerConf, func(grpcServer *grpc.Server) {{")?;
        for line in &registrations {
            writeln!(code, "{}", line)?;
        }
        writeln!(code)?;
        writeln!(code, "\t\tif c.Mode == service.DevMode || c.Mode == service.TestMode {{")?;
        writeln!(code, "\t\t\treflection.Register(grpcServer)")?;
        writeln!(code, "\t\t}}")?;
        writeln!(code, "\t}})")?;
        writeln!(code, "\tdefer s.Stop()")?;
        writeln!(code)?;
        writeln!(code, "\tfmt.Printf(\"Starting rpc server at %s...\\n\", c.ListenOn)")?;
        writeln!(code, "\ts.Start()")?;
        writeln!(code, "}}")?;

        write_if_absent(&main.filename.join(format!("{}.go", service_file)), &code)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::fixture;

    #[test]
    fn test_main_registers_servers() {
        let f = fixture::greeter(false);
        MainGenerator.generate(&f.dir, &f.proto, &f.cfg, &f.ctx).expect("main should generate");

        let code = fixture::read(f.temp.path().join("greeter.go"));
        assert!(code.starts_with("package main\n"));
        assert!(code.contains("\"etc/greeter.yaml\""));
        assert!(code.contains("\t\tgreeter.RegisterGreeterServer(grpcServer, server.NewGreeterServer(ctx))\n"));
        assert!(code.contains("fmt.Printf(\"Starting rpc server at %s...\\n\", c.ListenOn)"));
    }

    #[test]
    fn test_main_multiple_services() {
        let f = fixture::greeter(true);
        MainGenerator.generate(&f.dir, &f.proto, &f.cfg, &f.ctx).expect("main should generate");

        let code = fixture::read(f.temp.path().join("greeter.go"));
        assert!(code.contains("\tgreeterserver \"example.com/greeter/internal/server/greeter\"\n"));
        assert!(code.contains("greeter.RegisterAdminServer(grpcServer, adminserver.NewAdminServer(ctx))"));
    }
}
