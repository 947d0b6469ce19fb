//! Server adapters that route each method to its logic type.

use std::fmt::Write as _;

use config::{Config, RunContext};
use ir::{Rpc, ServiceDescription};

use super::{write_imports, GoImport};
use crate::utils::{go_camel, message_ref, GENERATED_HEADER};
use crate::{write_generated, DirContext, DirKind, Result, StageGenerator, StageKind};

/// Writes `internal/server/<service>server.go` for every service
pub struct ServerGenerator;

impl StageGenerator for ServerGenerator {
    fn kind(&self) -> StageKind { StageKind::Server }

    fn generate(
        &self,
        dir: &DirContext,
        proto: &ServiceDescription,
        cfg: &Config,
        _ctx: &RunContext,
    ) -> Result<()> {
        let pb = dir.get(DirKind::Pb)?;
        let svc = dir.get(DirKind::Svc)?;
        let src = proto.src.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

        for service in &proto.services {
            let Some(dirs) = dir.service(&service.name) else { continue };
            let server_type = format!("{}Server", go_camel(&service.name));
            // In multiple mode the logic and server packages share a name
            let (logic_alias, logic_import): (String, GoImport) = if dir.is_multiple() {
                let alias = format!("{}logic", dirs.logic.base);
                (alias.clone(), (Some(alias), dirs.logic.package.clone()))
            } else {
                (dirs.logic.base.clone(), (None, dirs.logic.package.clone()))
            };

            let mut code = String::new();
            writeln!(code, "{}", GENERATED_HEADER)?;
            writeln!(code, "// Source: {}", src)?;
            writeln!(code)?;
            writeln!(code, "package {}", dirs.server.base)?;
            writeln!(code)?;
            let std_imports: &[&str] =
                if service.rpcs.iter().any(|r| !r.is_streaming()) { &["context"] } else { &[] };
            write_imports(
                &mut code,
                std_imports,
                &[logic_import, (None, pb.package.clone()), (None, svc.package.clone())],
                &[],
            )?;

            writeln!(code, "type {} struct {{", server_type)?;
            writeln!(code, "\tsvcCtx *svc.ServiceContext")?;
            writeln!(code, "\t{}.Unimplemented{}Server", pb.base, go_camel(&service.name))?;
            writeln!(code, "}}")?;
            writeln!(code)?;
            writeln!(code, "func New{0}(svcCtx *svc.ServiceContext) *{0} {{", server_type)?;
            writeln!(code, "\treturn &{}{{", server_type)?;
            writeln!(code, "\t\tsvcCtx: svcCtx,")?;
            writeln!(code, "\t}}")?;
            writeln!(code, "}}")?;

            for rpc in &service.rpcs {
                writeln!(code)?;
                render_method(&mut code, &server_type, &logic_alias, &pb.base, &service.name, proto, rpc)?;
            }

            let name = format!("{}.go", cfg.naming.style.format(&server_type));
            write_generated(&dirs.server.filename, &[(name, code)])?;
        }
        Ok(())
    }
}

fn render_method(
    code: &mut String,
    server_type: &str,
    logic_pkg: &str,
    pb_pkg: &str,
    service: &str,
    proto: &ServiceDescription,
    rpc: &Rpc,
) -> Result<()> {
    let method = go_camel(&rpc.name);
    let stream = format!("{}.{}_{}Server", pb_pkg, go_camel(service), method);
    let request = message_ref(pb_pkg, proto, &rpc.request);

    match (rpc.client_streaming, rpc.server_streaming) {
        (false, false) => {
            let response = message_ref(pb_pkg, proto, &rpc.response);
            writeln!(
                code,
                "func (s *{}) {}(ctx context.Context, in {}) ({}, error) {{",
                server_type, method, request, response
            )?;
            writeln!(code, "\tl := {}.New{}Logic(ctx, s.svcCtx)", logic_pkg, method)?;
            writeln!(code, "\treturn l.{}(in)", method)?;
        }
        (false, true) => {
            writeln!(code, "func (s *{}) {}(in {}, stream {}) error {{", server_type, method, request, stream)?;
            writeln!(code, "\tl := {}.New{}Logic(stream.Context(), s.svcCtx)", logic_pkg, method)?;
            writeln!(code, "\treturn l.{}(in, stream)", method)?;
        }
        (true, _) => {
            writeln!(code, "func (s *{}) {}(stream {}) error {{", server_type, method, stream)?;
            writeln!(code, "\tl := {}.New{}Logic(stream.Context(), s.svcCtx)", logic_pkg, method)?;
            writeln!(code, "\treturn l.{}(stream)", method)?;
        }
    }
    writeln!(code, "}}")?;
    Ok(())
}
