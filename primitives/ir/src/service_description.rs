//! Service description
//!
//! This module defines the structures that represent a parsed protocol
//! definition: the services it exposes, their methods, and the message
//! types they exchange.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Parsed representation of a protocol-definition source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescription {
    /// Path of the source file this description was parsed from
    pub src: PathBuf,
    /// Proto file stem (e.g. "greeter" for `greeter.proto`)
    pub name: String,
    /// Syntax declared by the source (e.g. "proto3")
    pub syntax: String,
    /// Declared proto package (e.g. "greeter")
    pub package: String,
    /// Value of `option go_package` (empty when absent)
    pub go_package: String,
    /// Imports in declaration order
    pub imports: Vec<Import>,
    /// Message types, including nested messages under dotted names
    pub messages: Vec<Message>,
    /// Enum types
    pub enums: Vec<Enum>,
    /// Services in declaration order
    pub services: Vec<Service>,
}

/// An `import` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Imported path as written in the source
    pub path: String,
    /// Whether the import was declared `public`
    #[serde(default)]
    pub public: bool,
}

/// A message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message name; nested messages use `Outer.Inner`
    pub name: String,
    /// Declared fields
    pub fields: Vec<Field>,
    /// Source file the message was declared in, when it came from an import
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported_from: Option<String>,
}

/// A message field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field type as written (e.g. "string", "map<string, int64>", "User")
    pub ty: String,
    /// Field number
    pub number: u32,
    /// Field label
    #[serde(default)]
    pub label: FieldLabel,
}

/// Field cardinality label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldLabel {
    /// No label (proto3 singular)
    #[default]
    Singular,
    /// `optional`
    Optional,
    /// `repeated`
    Repeated,
}

/// An enum type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enum {
    /// Enum name; nested enums use `Outer.Inner`
    pub name: String,
    /// Value names in declaration order
    pub values: Vec<String>,
}

/// A service with its ordered methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Service name as written in the source
    pub name: String,
    /// Methods in declaration order
    pub rpcs: Vec<Rpc>,
}

/// A service method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rpc {
    /// Method name
    pub name: String,
    /// Request message type
    pub request: String,
    /// Response message type
    pub response: String,
    /// Whether the request side is a stream
    #[serde(default)]
    pub client_streaming: bool,
    /// Whether the response side is a stream
    #[serde(default)]
    pub server_streaming: bool,
}

impl ServiceDescription {
    /// Create an empty description for the given source path
    pub fn new(src: impl Into<PathBuf>) -> Self {
        let src = src.into();
        let name = src.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        Self { src, name, ..Self::default() }
    }

    /// Look up a message by name, accepting a leading package qualifier
    pub fn find_message(&self, name: &str) -> Option<&Message> {
        let local = self.strip_package(name);
        self.messages.iter().find(|m| m.name == local)
    }

    /// Whether `name` refers to a declared message or enum
    pub fn declares_type(&self, name: &str) -> bool {
        let local = self.strip_package(name);
        self.messages.iter().any(|m| m.name == local) || self.enums.iter().any(|e| e.name == local)
    }

    /// Get a service by name
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Total number of methods across all services
    pub fn rpc_count(&self) -> usize { self.services.iter().map(|s| s.rpcs.len()).sum() }

    /// Go package name derived from `go_package`, falling back to the proto package
    ///
    /// `"example.com/greeter/pb;greeterpb"` yields `greeterpb`,
    /// `"example.com/greeter/pb"` yields `pb`.
    pub fn go_package_name(&self) -> String {
        if let Some((_, alias)) = self.go_package.split_once(';') {
            return alias.to_string();
        }
        if let Some(last) = self.go_package.rsplit('/').next().filter(|s| !s.is_empty()) {
            return last.to_string();
        }
        self.package.replace('.', "_")
    }

    /// Append the messages and enums of an imported description
    pub fn absorb_import(&mut self, imported: ServiceDescription) {
        let origin = imported.src.to_string_lossy().into_owned();
        for mut message in imported.messages {
            if self.messages.iter().any(|m| m.name == message.name) {
                continue;
            }
            message.imported_from.get_or_insert_with(|| origin.clone());
            self.messages.push(message);
        }
        for e in imported.enums {
            if !self.enums.iter().any(|existing| existing.name == e.name) {
                self.enums.push(e);
            }
        }
    }

    fn strip_package<'a>(&self, name: &'a str) -> &'a str {
        let name = name.trim_start_matches('.');
        if self.package.is_empty() {
            return name;
        }
        name.strip_prefix(self.package.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name)
    }
}

impl Service {
    /// Get a method by name
    pub fn rpc(&self, name: &str) -> Option<&Rpc> { self.rpcs.iter().find(|r| r.name == name) }
}

impl Rpc {
    /// Whether either side of the method streams
    pub fn is_streaming(&self) -> bool { self.client_streaming || self.server_streaming }
}
