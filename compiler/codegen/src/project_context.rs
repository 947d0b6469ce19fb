//! The Go module a generated project lives in.

use std::path::{Path, PathBuf};

use crate::Result;

/// Module information for the directory a project is generated into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    /// Import path of the owning module (e.g. `example.com/greeter`)
    pub path: String,
    /// Short module name
    pub name: String,
    /// Absolute output directory
    pub dir: PathBuf,
    /// Directory holding `go.mod`; equals `dir` when no manifest exists yet
    pub module_root: PathBuf,
}

impl ProjectContext {
    /// Work out module information for the absolute output directory `abs`.
    ///
    /// The nearest `go.mod` at or above `abs` wins. Without one, `module_name`
    /// is used when non-empty and the directory name otherwise; the module root
    /// is then `abs` itself.
    pub fn prepare(abs: &Path, module_name: &str) -> Result<Self> {
        if let Some(go_mod) = path::find_go_mod(abs) {
            if let Some(module) = path::read_module_path(&go_mod)? {
                let module_root = go_mod.parent().map(Path::to_path_buf).unwrap_or_default();
                let relative = abs.strip_prefix(&module_root).unwrap_or(Path::new(""));
                let import_path = path::join_package(&module, &relative.to_string_lossy());
                let name = module.rsplit('/').next().unwrap_or(&module).to_string();

                tracing::debug!(module = %module, root = %module_root.display(), "found go.mod");
                return Ok(Self { path: import_path, name, dir: abs.to_path_buf(), module_root });
            }
        }

        let module = if module_name.is_empty() {
            abs.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| format!("cannot derive a module name from '{}'", abs.display()))?
        } else {
            module_name.to_string()
        };
        let name = module.rsplit('/').next().unwrap_or(&module).to_string();
        Ok(Self { path: module, name, dir: abs.to_path_buf(), module_root: abs.to_path_buf() })
    }

    /// Import path of the package at `dir`, which must lie inside the project
    pub fn package_of(&self, dir: &Path) -> String {
        let relative = dir.strip_prefix(&self.dir).unwrap_or(Path::new(""));
        path::join_package(&self.path, &relative.to_string_lossy())
    }
}
