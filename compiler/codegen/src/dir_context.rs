//! Directory layout of a generated project.
//!
//! ```text
//! <output>/
//! ├── etc/<service>.yaml
//! ├── internal/
//! │   ├── config/
//! │   ├── logic/        (logic/<service>/ in multiple mode)
//! │   ├── server/       (server/<service>/ in multiple mode)
//! │   └── svc/
//! ├── <go package>/     protoc output
//! ├── <service>client/  (client/<service>/ in multiple mode)
//! ├── ent/
//! └── <service>.go, Makefile, Dockerfile
//! ```

use std::path::PathBuf;

use config::{Config, RunContext};
use convert_case::{Case, Casing};
use ir::ServiceDescription;

use crate::project_context::ProjectContext;
use crate::{CodegenError, Result};

/// A logical output category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirKind {
    /// Deployment configuration
    Etc,
    /// Config struct package
    Config,
    /// Business logic packages
    Logic,
    /// Server adapter packages
    Server,
    /// Service context package
    Svc,
    /// protoc output package
    Pb,
    /// Client helper packages
    Call,
    /// Entry point
    Main,
    /// Makefile location
    Makefile,
    /// Dockerfile location
    Dockerfile,
    /// ORM schema root
    Ent,
}

/// One output directory and the Go package it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dir {
    /// Absolute directory path
    pub filename: PathBuf,
    /// Go import path of the package
    pub package: String,
    /// Go package name (last path segment)
    pub base: String,
}

impl Dir {
    fn new(project: &ProjectContext, filename: PathBuf) -> Self {
        let package = project.package_of(&filename);
        let base = package.rsplit('/').next().unwrap_or_default().to_string();
        Self { filename, package, base }
    }
}

/// Name of the generated service, taken from the protocol file stem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceName(String);

impl ServiceName {
    /// Wrap a raw name
    pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

    /// The name as written
    pub fn source(&self) -> &str { &self.0 }

    /// Exported Go form: each `_`-separated part gets an upper-case first letter
    /// and the rest stays as written, so `user_center` becomes `UserCenter`
    /// and `coreRPC` becomes `CoreRPC`
    pub fn to_camel(&self) -> String {
        self.0
            .split('_')
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect()
    }

    /// snake_case form
    pub fn to_snake(&self) -> String { self.0.to_case(Case::Snake) }

    /// All lower case without separators
    pub fn lower(&self) -> String { self.to_snake().replace('_', "") }
}

/// Directories for one declared service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDirs {
    /// Service name as declared
    pub service: String,
    /// Logic package
    pub logic: Dir,
    /// Server package
    pub server: Dir,
    /// Client helper package
    pub call: Dir,
}

/// Computed layout shared by every stage of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirContext {
    service_name: ServiceName,
    multiple: bool,
    etc: Dir,
    config: Dir,
    svc: Dir,
    pb: Dir,
    main: Dir,
    ent: Dir,
    services: Vec<ServiceDirs>,
}

impl DirContext {
    /// The derived service name
    pub fn service_name(&self) -> &ServiceName { &self.service_name }

    /// Whether services get their own logic/server/client packages
    pub fn is_multiple(&self) -> bool { self.multiple }

    /// Directory for a category that is not per service
    ///
    /// Logic, server and call directories come from [`DirContext::services`];
    /// asking for them here yields the first service's directory.
    pub fn get(&self, kind: DirKind) -> Result<&Dir> {
        let first = self.services.first();
        let dir = match kind {
            DirKind::Etc => &self.etc,
            DirKind::Config => &self.config,
            DirKind::Svc => &self.svc,
            DirKind::Pb => &self.pb,
            DirKind::Main | DirKind::Makefile | DirKind::Dockerfile => &self.main,
            DirKind::Ent => &self.ent,
            DirKind::Logic => &first.ok_or_else(no_services)?.logic,
            DirKind::Server => &first.ok_or_else(no_services)?.server,
            DirKind::Call => &first.ok_or_else(no_services)?.call,
        };
        Ok(dir)
    }

    /// Per-service directories, in declaration order
    pub fn services(&self) -> &[ServiceDirs] { &self.services }

    /// Directories of the named service
    pub fn service(&self, name: &str) -> Option<&ServiceDirs> {
        self.services.iter().find(|s| s.service == name)
    }
}

fn no_services() -> CodegenError { CodegenError::Message("layout has no services".to_string()) }

/// Compute the output layout for one run.
///
/// # Arguments
///
/// * `project` - Module information for the absolute output directory
/// * `proto` - The parsed description; must declare at least one service
/// * `cfg` - Generator configuration
/// * `ctx` - Run options; `multiple` and `proto_gen_go_dir` shape the layout
pub fn build_dir_context(
    project: &ProjectContext,
    proto: &ServiceDescription,
    _cfg: &Config,
    ctx: &RunContext,
) -> Result<DirContext> {
    if proto.services.is_empty() {
        return Err(no_services());
    }

    let root = project.dir.clone();
    let internal = root.join("internal");
    let pb_dir = if ctx.proto_gen_go_dir.as_os_str().is_empty() {
        root.join(proto.go_package_name())
    } else if ctx.proto_gen_go_dir.is_absolute() {
        ctx.proto_gen_go_dir.clone()
    } else {
        root.join(&ctx.proto_gen_go_dir)
    };

    let services = proto
        .services
        .iter()
        .map(|service| {
            let lower = ServiceName::new(service.name.as_str()).lower();
            let (logic, server, call) = if ctx.multiple {
                (
                    internal.join("logic").join(&lower),
                    internal.join("server").join(&lower),
                    root.join("client").join(&lower),
                )
            } else {
                (
                    internal.join("logic"),
                    internal.join("server"),
                    root.join(format!("{}client", lower)),
                )
            };
            ServiceDirs {
                service: service.name.clone(),
                logic: Dir::new(project, logic),
                server: Dir::new(project, server),
                call: Dir::new(project, call),
            }
        })
        .collect();

    let layout = DirContext {
        service_name: ServiceName::new(proto.name.as_str()),
        multiple: ctx.multiple,
        etc: Dir::new(project, root.join("etc")),
        config: Dir::new(project, internal.join("config")),
        svc: Dir::new(project, internal.join("svc")),
        pb: Dir::new(project, pb_dir),
        main: Dir::new(project, root.clone()),
        ent: Dir::new(project, root.join("ent")),
        services,
    };

    for dir in layout.all_dirs() {
        path::mkdir_if_not_exist(&dir.filename)?;
    }
    tracing::debug!(
        root = %root.display(),
        services = layout.services.len(),
        multiple = layout.multiple,
        "built directory context"
    );
    Ok(layout)
}

impl DirContext {
    /// Directories that must exist before any stage writes; `ent/` is left to the ORM toolchain
    fn all_dirs(&self) -> Vec<&Dir> {
        let mut dirs = vec![&self.etc, &self.config, &self.svc, &self.pb, &self.main];
        for service in &self.services {
            dirs.extend([&service.logic, &service.server, &service.call]);
        }
        dirs
    }
}
