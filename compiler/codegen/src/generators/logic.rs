//! Business logic stubs, one file per method.
//!
//! These files hold hand-written code once generated, so an existing file is
//! never touched. Re-running after adding a method only creates the new stub.

use std::fmt::Write as _;

use config::{Config, RunContext};
use ir::{Rpc, ServiceDescription};

use super::write_imports;
use crate::utils::{go_camel, local_type_name, method_signature};
use crate::{write_if_absent, DirContext, DirKind, Result, StageGenerator, StageKind};

/// Writes `internal/logic/<method>logic.go` for every method
pub struct LogicGenerator;

impl StageGenerator for LogicGenerator {
    fn kind(&self) -> StageKind { StageKind::Logic }

    fn generate(
        &self,
        dir: &DirContext,
        proto: &ServiceDescription,
        cfg: &Config,
        _ctx: &RunContext,
    ) -> Result<()> {
        let pb = dir.get(DirKind::Pb)?;
        let svc = dir.get(DirKind::Svc)?;

        for service in &proto.services {
            let Some(dirs) = dir.service(&service.name) else { continue };
            let mut written = 0usize;

            for rpc in &service.rpcs {
                let logic_type = format!("{}Logic", go_camel(&rpc.name));
                let file = dirs.logic.filename.join(format!("{}.go", cfg.naming.style.format(&logic_type)));

                let mut code = String::new();
                writeln!(code, "package {}", dirs.logic.base)?;
                writeln!(code)?;
                write_imports(
                    &mut code,
                    &["context"],
                    &[(None, pb.package.clone()), (None, svc.package.clone())],
                    &["github.com/zeromicro/go-zero/core/logx"],
                )?;
                render_logic(&mut code, &logic_type, &pb.base, &service.name, proto, rpc)?;

                if write_if_absent(&file, &code)? {
                    written += 1;
                }
            }
            tracing::debug!(service = %service.name, written, total = service.rpcs.len(), "logic stubs");
        }
        Ok(())
    }
}

fn render_logic(
    code: &mut String,
    logic_type: &str,
    pb_pkg: &str,
    service: &str,
    proto: &ServiceDescription,
    rpc: &Rpc,
) -> Result<()> {
    writeln!(code, "type {} struct {{", logic_type)?;
    writeln!(code, "\tctx    context.Context")?;
    writeln!(code, "\tsvcCtx *svc.ServiceContext")?;
    writeln!(code, "\tlogx.Logger")?;
    writeln!(code, "}}")?;
    writeln!(code)?;
    writeln!(
        code,
        "func New{0}(ctx context.Context, svcCtx *svc.ServiceContext) *{0} {{",
        logic_type
    )?;
    writeln!(code, "\treturn &{}{{", logic_type)?;
    writeln!(code, "\t\tctx:    ctx,")?;
    writeln!(code, "\t\tsvcCtx: svcCtx,")?;
    writeln!(code, "\t\tLogger: logx.WithContext(ctx),")?;
    writeln!(code, "\t}}")?;
    writeln!(code, "}}")?;
    writeln!(code)?;

    let method = go_camel(&rpc.name);
    writeln!(
        code,
        "func (l *{}) {}{} {{",
        logic_type,
        method,
        method_signature(pb_pkg, service, proto, rpc)
    )?;
    writeln!(code, "\t// todo: add your logic here and delete this line")?;
    writeln!(code)?;
    if rpc.is_streaming() {
        writeln!(code, "\treturn nil")?;
    } else {
        let response = go_camel(local_type_name(proto, &rpc.response));
        writeln!(code, "\treturn &{}.{}{{}}, nil", pb_pkg, response)?;
    }
    writeln!(code, "}}")?;
    Ok(())
}
