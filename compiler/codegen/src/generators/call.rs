use std::fmt::Write as _;

use config::{Config, RunContext};
use ir::{Rpc, ServiceDescription};

use super::write_imports;
use crate::utils::{go_camel, local_type_name, GENERATED_HEADER};
use crate::{write_generated, DirContext, DirKind, Result, StageGenerator, StageKind};

/// Writes a typed client wrapper package for every service
///
/// The package re-exports the local message types as aliases so callers need
/// not import the protoc output directly.
pub struct CallGenerator;

impl StageGenerator for CallGenerator {
    fn kind(&self) -> StageKind { StageKind::Call }

    fn generate(
        &self,
        dir: &DirContext,
        proto: &ServiceDescription,
        cfg: &Config,
        _ctx: &RunContext,
    ) -> Result<()> {
        let pb = dir.get(DirKind::Pb)?;
        let src = proto.src.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let aliases: Vec<String> = proto
            .messages
            .iter()
            .filter(|m| m.imported_from.is_none())
            .map(|m| go_camel(&m.name))
            .collect();
        let width = aliases.iter().map(String::len).max().unwrap_or(0);

        for service in &proto.services {
            let Some(dirs) = dir.service(&service.name) else { continue };
            let service_type = go_camel(&service.name);

            let mut code = String::new();
            writeln!(code, "{}", GENERATED_HEADER)?;
            writeln!(code, "// Source: {}", src)?;
            writeln!(code)?;
            writeln!(code, "package {}", dirs.call.base)?;
            writeln!(code)?;
            write_imports(
                &mut code,
                &["context"],
                &[(None, pb.package.clone())],
                &["github.com/zeromicro/go-zero/zrpc", "google.golang.org/grpc"],
            )?;

            writeln!(code, "type (")?;
            for alias in &aliases {
                writeln!(code, "\t{:<width$} = {}.{}", alias, pb.base, alias, width = width)?;
            }
            if !aliases.is_empty() {
                writeln!(code)?;
            }
            writeln!(code, "\t{} interface {{", service_type)?;
            for rpc in &service.rpcs {
                writeln!(code, "\t\t{}", client_signature(&pb.base, &service_type, proto, rpc))?;
            }
            writeln!(code, "\t}}")?;
            writeln!(code)?;
            writeln!(code, "\tdefault{} struct {{", service_type)?;
            writeln!(code, "\t\tcli zrpc.Client")?;
            writeln!(code, "\t}}")?;
            writeln!(code, ")")?;
            writeln!(code)?;
            writeln!(code, "func New{0}(cli zrpc.Client) {0} {{", service_type)?;
            writeln!(code, "\treturn &default{}{{", service_type)?;
            writeln!(code, "\t\tcli: cli,")?;
            writeln!(code, "\t}}")?;
            writeln!(code, "}}")?;

            for rpc in &service.rpcs {
                let method = go_camel(&rpc.name);
                writeln!(code)?;
                writeln!(
                    code,
                    "func (m *default{}) {} {{",
                    service_type,
                    client_signature(&pb.base, &service_type, proto, rpc)
                )?;
                writeln!(code, "\tclient := {}.New{}Client(m.cli.Conn())", pb.base, service_type)?;
                if rpc.client_streaming {
                    writeln!(code, "\treturn client.{}(ctx, opts...)", method)?;
                } else {
                    writeln!(code, "\treturn client.{}(ctx, in, opts...)", method)?;
                }
                writeln!(code, "}}")?;
            }

            let name = format!("{}.go", cfg.naming.style.format(&service.name));
            write_generated(&dirs.call.filename, &[(name, code)])?;
        }
        Ok(())
    }
}

/// `Name(ctx, in, opts...) (result, error)` as declared on the client interface
fn client_signature(pb_pkg: &str, service_type: &str, proto: &ServiceDescription, rpc: &Rpc) -> String {
    let method = go_camel(&rpc.name);
    let request = go_camel(local_type_name(proto, &rpc.request));
    let response = go_camel(local_type_name(proto, &rpc.response));
    let stream = format!("{}.{}_{}Client", pb_pkg, service_type, method);

    match (rpc.client_streaming, rpc.server_streaming) {
        (false, false) => format!(
            "{}(ctx context.Context, in *{}, opts ...grpc.CallOption) (*{}, error)",
            method, request, response
        ),
        (false, true) => format!(
            "{}(ctx context.Context, in *{}, opts ...grpc.CallOption) ({}, error)",
            method, request, stream
        ),
        (true, _) => format!("{}(ctx context.Context, opts ...grpc.CallOption) ({}, error)", method, stream),
    }
}
