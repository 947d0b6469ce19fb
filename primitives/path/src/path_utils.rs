// SPDX-License-Identifier: CC0-1.0

//! Path utility functions for preparing output trees.
//!
//! This module provides utilities for resolving absolute paths, creating
//! directories on demand, and locating the Go module that owns a directory.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Name of the Go module manifest file
pub const GO_MOD: &str = "go.mod";

/// Resolve `path` against the current directory without touching the filesystem
///
/// `.` and `..` components are folded lexically so the result is stable even
/// when the directory does not exist yet.
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty path"));
    }
    let joined = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Create `dir` and all of its parents if it does not exist yet
pub fn mkdir_if_not_exist(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)
}

/// Whether a regular file (or symlink to one) exists at `path`
pub fn file_exists(path: &Path) -> bool { path.is_file() }

/// Find the nearest `go.mod`, starting at `start` and walking up the directory tree
///
/// # Returns
///
/// Returns the path of the manifest, or `None` when no ancestor carries one.
pub fn find_go_mod(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(GO_MOD);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Read the module path declared by a `go.mod` file
///
/// # Returns
///
/// Returns `Ok(None)` when the manifest has no `module` directive.
pub fn read_module_path(go_mod: &Path) -> io::Result<Option<String>> {
    let content = fs::read_to_string(go_mod)?;
    Ok(parse_module_directive(&content))
}

/// Extract the module path from the text of a `go.mod` file
pub fn parse_module_directive(content: &str) -> Option<String> {
    content.lines().map(str::trim).find_map(|line| {
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let module = rest.split("//").next().unwrap_or_default().trim().trim_matches('"');
        (!module.is_empty()).then(|| module.to_string())
    })
}

/// Join a Go import path with a relative filesystem path
///
/// Backslashes are converted so Windows paths yield valid import paths.
///
/// # Examples
///
/// ```
/// use rpcgen_path::join_package;
/// assert_eq!(join_package("example.com/greeter", "internal/svc"), "example.com/greeter/internal/svc");
/// assert_eq!(join_package("example.com/greeter", ""), "example.com/greeter");
/// ```
pub fn join_package(module: &str, relative: &str) -> String {
    let relative = relative.replace('\\', "/");
    let relative = relative.trim_matches('/');
    match (module.is_empty(), relative.is_empty()) {
        (_, true) => module.to_string(),
        (true, false) => relative.to_string(),
        (false, false) => format!("{}/{}", module.trim_end_matches('/'), relative),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_folds_dot_components() {
        let base = std::env::current_dir().expect("Failed to get current directory");
        let resolved = absolute(Path::new("./out/../gen")).expect("Failed to resolve path");
        assert_eq!(resolved, base.join("gen"));
        assert!(absolute(Path::new("")).is_err());
    }

    #[test]
    fn test_mkdir_if_not_exist() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let nested = temp_dir.path().join("a").join("b");
        mkdir_if_not_exist(&nested).expect("Failed to create nested directory");
        assert!(nested.is_dir());
        // Second call is a no-op
        mkdir_if_not_exist(&nested).expect("Existing directory should be accepted");
    }

    #[test]
    fn test_mkdir_rejects_file_in_the_way() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "x").expect("Failed to write file");
        assert!(mkdir_if_not_exist(&blocker.join("child")).is_err());
    }

    #[test]
    fn test_find_go_mod_walks_up() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let root = temp_dir.path();
        fs::write(root.join(GO_MOD), "module example.com/greeter\n\ngo 1.22\n")
            .expect("Failed to write go.mod");
        let nested = root.join("rpc").join("greeter");
        fs::create_dir_all(&nested).expect("Failed to create nested directory");

        let found = find_go_mod(&nested).expect("go.mod should be found");
        assert_eq!(found, root.join(GO_MOD));
        let module = read_module_path(&found).expect("Failed to read go.mod");
        assert_eq!(module.as_deref(), Some("example.com/greeter"));
    }

    #[test]
    fn test_parse_module_directive() {
        assert_eq!(
            parse_module_directive("// comment\nmodule \"example.com/a\" // trailing\n"),
            Some("example.com/a".to_string())
        );
        assert_eq!(parse_module_directive("modules example.com/a\n"), None);
        assert_eq!(parse_module_directive("go 1.22\n"), None);
    }

    #[test]
    fn test_join_package() {
        assert_eq!(join_package("", "internal/logic"), "internal/logic");
        assert_eq!(join_package("example.com/a/", "/internal\\svc/"), "example.com/a/internal/svc");
    }
}
