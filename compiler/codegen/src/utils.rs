// codegen/src/utils.rs

use ir::{Rpc, ServiceDescription};

/// Header marking files that are rewritten on every run
pub const GENERATED_HEADER: &str = "// Code generated by rpcgen. DO NOT EDIT.";

/// Convert a proto identifier to the Go identifier protoc-gen-go emits
///
/// Underscores before a lower-case letter or digit are dropped and the letter
/// upper-cased; nested type separators (`.`) become `_`.
///
/// `hello_req` → `HelloReq`, `HelloReq.Meta` → `HelloReq_Meta`, `get_v2` → `GetV2`
pub fn go_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    let mut upper_next = true;

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                out.push('_');
                upper_next = true;
            }
            '_' if matches!(chars.peek(), Some(n) if n.is_ascii_lowercase() || n.is_ascii_digit()) => {
                upper_next = true;
            }
            c if c.is_ascii_digit() => {
                out.push(c);
                upper_next = true;
            }
            c if upper_next => {
                out.push(c.to_ascii_uppercase());
                upper_next = false;
            }
            c => out.push(c),
        }
    }
    out
}

/// Go type of a message referenced from generated code, e.g. `*pb.HelloReq`
pub fn message_ref(pb_pkg: &str, proto: &ServiceDescription, ty: &str) -> String {
    format!("*{}.{}", pb_pkg, go_camel(local_type_name(proto, ty)))
}

/// Strip a leading dot and the description's own package from a type name
pub fn local_type_name<'a>(proto: &ServiceDescription, ty: &'a str) -> &'a str {
    let ty = ty.trim_start_matches('.');
    if proto.package.is_empty() {
        return ty;
    }
    ty.strip_prefix(proto.package.as_str()).and_then(|rest| rest.strip_prefix('.')).unwrap_or(ty)
}

/// Parameter list and result of a logic/server method
///
/// Streaming methods take the generated stream handle instead of a request.
pub fn method_signature(pb_pkg: &str, service: &str, proto: &ServiceDescription, rpc: &Rpc) -> String {
    let request = message_ref(pb_pkg, proto, &rpc.request);
    let response = message_ref(pb_pkg, proto, &rpc.response);
    let stream = format!("{}.{}_{}Server", pb_pkg, go_camel(service), go_camel(&rpc.name));

    match (rpc.client_streaming, rpc.server_streaming) {
        (false, false) => format!("(in {}) ({}, error)", request, response),
        (false, true) => format!("(in {}, stream {}) error", request, stream),
        (true, _) => format!("(stream {}) error", stream),
    }
}
