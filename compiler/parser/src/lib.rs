#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Protocol Parser
//!
//! This crate turns a protocol-definition source file into a
//! [`ServiceDescription`]. In multi-file mode the parser also follows
//! `import` statements and folds the imported message types into the result.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use ir::ServiceDescription;
use thiserror::Error;

pub mod grammar;

/// Imports under this prefix ship with protoc and are never resolved on disk
const WELL_KNOWN_PREFIX: &str = "google/protobuf/";

#[derive(Debug, Error)]
/// Errors that can occur while parsing a protocol source
pub enum ParseError {
    /// The source (or one of its imports) could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed to load
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The source is malformed
    #[error("{}:{line}: {message}", path.display())]
    Syntax {
        /// File containing the error
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Description of the problem
        message: String,
    },
    /// An import could not be found relative to the importing file
    #[error("{}: unresolved import \"{import}\"", path.display())]
    UnresolvedImport {
        /// File declaring the import
        path: PathBuf,
        /// Import path as written
        import: String,
    },
    /// Single-file mode requires exactly one service
    #[error("{}: expected exactly one service, found {found} (use multiple mode for more)", path.display())]
    ServiceCount {
        /// Source file
        path: PathBuf,
        /// Number of services declared
        found: usize,
    },
    /// A method references a message that is not declared
    #[error("rpc {rpc}: unknown message type '{ty}'")]
    UnknownType {
        /// Method name
        rpc: String,
        /// Unresolved type name
        ty: String,
    },
}

/// Result alias for parser operations
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parses protocol sources into service descriptions
///
/// This is the seam the orchestrator consumes; tests substitute their own
/// implementation to observe when (and whether) parsing happens.
pub trait ProtoParser: Send + Sync {
    /// Parse the source at `path`, following imports when `multiple` is set
    fn parse(&self, path: &Path, multiple: bool) -> ParseResult<ServiceDescription>;
}

/// Parser for proto2/proto3 sources on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProtoParser;

impl DefaultProtoParser {
    /// Create a new parser
    pub fn new() -> Self { Self }

    /// Parse a single file without following its imports
    pub fn parse_file(&self, path: &Path) -> ParseResult<ServiceDescription> {
        let source = std::fs::read_to_string(path)
            .map_err(|source| ParseError::Io { path: path.to_path_buf(), source })?;
        Self::parse_source(path, &source)
    }

    /// Parse already loaded source text attributed to `path`
    pub fn parse_source(path: &Path, source: &str) -> ParseResult<ServiceDescription> {
        grammar::parse_file(path, source).map_err(|e| ParseError::Syntax {
            path: path.to_path_buf(),
            line: e.line,
            message: e.message,
        })
    }

    fn follow_imports(
        &self,
        root: &mut ServiceDescription,
        importer: &Path,
        imports: &[ir::Import],
        visited: &mut BTreeSet<PathBuf>,
    ) -> ParseResult<()> {
        let base = importer.parent().unwrap_or_else(|| Path::new("."));
        let root_base = root.src.parent().map(Path::to_path_buf).unwrap_or_default();

        for import in imports {
            if import.path.starts_with(WELL_KNOWN_PREFIX) {
                continue;
            }
            let resolved = [base.join(&import.path), root_base.join(&import.path)]
                .into_iter()
                .find(|candidate| candidate.is_file())
                .ok_or_else(|| ParseError::UnresolvedImport {
                    path: importer.to_path_buf(),
                    import: import.path.clone(),
                })?;
            if !visited.insert(resolved.clone()) {
                continue;
            }

            tracing::debug!(import = %resolved.display(), "following import");
            let imported = self.parse_file(&resolved)?;
            let nested = imported.imports.clone();
            root.absorb_import(imported);
            self.follow_imports(root, &resolved, &nested, visited)?;
        }
        Ok(())
    }
}

impl ProtoParser for DefaultProtoParser {
    fn parse(&self, path: &Path, multiple: bool) -> ParseResult<ServiceDescription> {
        let mut description = self.parse_file(path)?;

        let found = description.services.len();
        if found == 0 || (!multiple && found > 1) {
            return Err(ParseError::ServiceCount { path: path.to_path_buf(), found });
        }

        if multiple {
            let imports = description.imports.clone();
            let mut visited = BTreeSet::from([path.to_path_buf()]);
            self.follow_imports(&mut description, path, &imports, &mut visited)?;
        }

        // Imported types are only known when imports were followed
        let can_check = multiple || description.imports.is_empty();
        for rpc in description.services.iter().flat_map(|s| s.rpcs.iter()) {
            for ty in [&rpc.request, &rpc.response] {
                let external = ty.contains('.') && !description.declares_type(ty);
                if can_check && !external && description.find_message(ty).is_none() {
                    return Err(ParseError::UnknownType { rpc: rpc.name.clone(), ty: ty.clone() });
                }
            }
        }

        tracing::debug!(
            src = %path.display(),
            services = description.services.len(),
            rpcs = description.rpc_count(),
            "parsed protocol source"
        );
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETER: &str = r#"
        syntax = "proto3";

        package greeter;
        option go_package = "./greeter";

        message HelloReq {
          string name = 1;
          repeated string tags = 2 [deprecated = true];
          map<string, int64> counters = 3;
          oneof contact {
            string email = 4;
            string phone = 5;
          }
          message Meta { int64 ts = 1; }
          enum Kind { KIND_UNKNOWN = 0; KIND_FRIEND = 1; }
        }

        message HelloResp { string greeting = 1; }

        service Greeter {
          option (svc.opt) = { deadline: 3 };
          rpc SayHello(HelloReq) returns (HelloResp);
          rpc Chat(stream HelloReq) returns (stream HelloResp) {
            option idempotency_level = NO_SIDE_EFFECTS;
          }
        }
    "#;

    #[test]
    fn test_parse_source_structure() {
        let description = DefaultProtoParser::parse_source(Path::new("greeter.proto"), GREETER)
            .expect("greeter should parse");

        assert_eq!(description.name, "greeter");
        assert_eq!(description.syntax, "proto3");
        assert_eq!(description.package, "greeter");
        assert_eq!(description.go_package, "./greeter");
        assert_eq!(description.go_package_name(), "greeter");

        let names: Vec<_> = description.messages.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["HelloReq", "HelloReq.Meta", "HelloResp"]);
        let req = description.find_message("HelloReq").expect("HelloReq should exist");
        assert_eq!(req.fields.len(), 5);
        assert_eq!(req.fields[1].label, ir::FieldLabel::Repeated);
        assert_eq!(req.fields[2].ty, "map<string, int64>");
        assert_eq!(description.enums[0].name, "HelloReq.Kind");
        assert_eq!(description.enums[0].values, vec!["KIND_UNKNOWN", "KIND_FRIEND"]);

        let service = description.service("Greeter").expect("Greeter should exist");
        assert_eq!(service.rpcs.len(), 2);
        let chat = service.rpc("Chat").expect("Chat should exist");
        assert!(chat.client_streaming && chat.server_streaming);
    }

    #[test]
    fn test_syntax_error_carries_line() {
        let err = DefaultProtoParser::parse_source(
            Path::new("bad.proto"),
            "syntax = \"proto3\";\n\nmessage A {\n  string name 1;\n}\n",
        )
        .expect_err("missing '=' should fail");
        match err {
            ParseError::Syntax { line, message, .. } => {
                assert_eq!(line, 4);
                assert!(message.contains("expected '='"), "got: {}", message);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_top_level_keyword() {
        let err = DefaultProtoParser::parse_source(Path::new("bad.proto"), "services Foo {}")
            .expect_err("unknown keyword should fail");
        assert!(err.to_string().contains("unexpected top-level keyword"));
    }
}
