//! Stage generators for a scaffolded service project.
//!
//! Each generator writes one category of output. Files a developer is expected
//! to edit (configuration, service context, logic, entry point, build files)
//! are only written when absent; adapter and client files carry
//! [`GENERATED_HEADER`](crate::utils::GENERATED_HEADER) and are rewritten on
//! every run.

use std::fmt::Write as _;

use crate::Result;

/// Sub-crate generates: **`etc/<service>.yaml`**
pub mod etc;
pub use etc::EtcGenerator;

/// Runs protoc for the wire-format bindings
pub mod pb;
pub use pb::PbGenerator;

pub mod config;
pub use config::ConfigGenerator;

pub mod svc;
pub use svc::SvcGenerator;

pub mod logic;
pub use logic::LogicGenerator;

pub mod server;
pub use server::ServerGenerator;

pub mod main_file;
pub use main_file::MainGenerator;

/// Typed client wrappers
pub mod call;
pub use call::CallGenerator;

pub mod makefile;
pub use makefile::MakefileGenerator;

pub mod dockerfile;
pub use dockerfile::DockerfileGenerator;

/// One Go import line: optional alias and import path
pub(crate) type GoImport = (Option<String>, String);

/// Write a grouped Go import block: standard library, project packages, third party
pub(crate) fn write_imports(
    code: &mut String,
    std: &[&str],
    project: &[GoImport],
    third_party: &[&str],
) -> Result<()> {
    let groups = [
        std.iter().map(|p| (None, p.to_string())).collect::<Vec<GoImport>>(),
        project.to_vec(),
        third_party.iter().map(|p| (None, p.to_string())).collect(),
    ];
    let groups: Vec<_> = groups.into_iter().filter(|g| !g.is_empty()).collect();
    if groups.is_empty() {
        return Ok(());
    }

    writeln!(code, "import (")?;
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            writeln!(code)?;
        }
        for (alias, path) in group {
            match alias {
                Some(alias) => writeln!(code, "\t{} \"{}\"", alias, path)?,
                None => writeln!(code, "\t\"{}\"", path)?,
            }
        }
    }
    writeln!(code, ")")?;
    writeln!(code)?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_imports_groups() {
        let mut code = String::new();
        write_imports(
            &mut code,
            &["context"],
            &[(Some("adminlogic".to_string()), "example.com/x/internal/logic/admin".to_string())],
            &["google.golang.org/grpc"],
        )
        .expect("imports should render");
        assert_eq!(
            code,
            "import (\n\t\"context\"\n\n\tadminlogic \"example.com/x/internal/logic/admin\"\n\n\t\"google.golang.org/grpc\"\n)\n\n"
        );

        let mut empty = String::new();
        write_imports(&mut empty, &[], &[], &[]).expect("empty imports should render");
        assert!(empty.is_empty());
    }
}
