use std::fs;
use std::path::Path;

use parser::{DefaultProtoParser, ParseError, ProtoParser};

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&path, content).expect("Failed to write proto file");
    path
}

const COMMON: &str = r#"
syntax = "proto3";
package shop;
import "google/protobuf/timestamp.proto";
message PageInfo { uint64 page = 1; uint64 page_size = 2; }
message IDReq { uint64 id = 1; }
"#;

const SHOP: &str = r#"
syntax = "proto3";
package shop;
option go_package = "./shop";
import "common/common.proto";

message ProductInfo { uint64 id = 1; string name = 2; }
message ProductList { repeated ProductInfo data = 1; uint64 total = 2; }

service Product {
  rpc getProductList(PageInfo) returns (ProductList);
  rpc getProductById(IDReq) returns (ProductInfo);
}

service Order {
  rpc getOrderById(IDReq) returns (ProductInfo);
}
"#;

#[test]
fn multiple_mode_follows_imports() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    write(dir.path(), "common/common.proto", COMMON);
    let src = write(dir.path(), "shop.proto", SHOP);

    let description = DefaultProtoParser::new().parse(&src, true).expect("shop should parse");

    assert_eq!(description.services.len(), 2);
    assert_eq!(description.rpc_count(), 3);
    let page = description.find_message("PageInfo").expect("imported message should be absorbed");
    assert!(page
        .imported_from
        .as_deref()
        .expect("imported message should carry its origin")
        .ends_with("common.proto"));
}

#[test]
fn single_mode_rejects_multiple_services() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    write(dir.path(), "common/common.proto", COMMON);
    let src = write(dir.path(), "shop.proto", SHOP);

    match DefaultProtoParser::new().parse(&src, false).expect_err("two services should fail") {
        ParseError::ServiceCount { found, .. } => assert_eq!(found, 2),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn single_mode_does_not_read_imports() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    // The import target does not exist; single mode must not care
    let src = write(
        dir.path(),
        "user.proto",
        r#"
        syntax = "proto3";
        package user;
        import "missing/base.proto";
        message UserInfo { string id = 1; }
        service User { rpc getUser(IDReq) returns (UserInfo); }
        "#,
    );

    let description = DefaultProtoParser::new().parse(&src, false).expect("user should parse");
    assert_eq!(description.imports.len(), 1);
    assert!(description.find_message("IDReq").is_none());
}

#[test]
fn multiple_mode_reports_unresolved_import() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let src = write(dir.path(), "shop.proto", SHOP);

    match DefaultProtoParser::new().parse(&src, true).expect_err("missing import should fail") {
        ParseError::UnresolvedImport { import, .. } => assert_eq!(import, "common/common.proto"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn unknown_request_type_is_rejected() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let src = write(
        dir.path(),
        "ping.proto",
        r#"
        syntax = "proto3";
        package ping;
        message Pong {}
        service Ping {
          rpc ping(Ping) returns (Pong);
          rpc empty(google.protobuf.Empty) returns (Pong);
        }
        "#,
    );

    match DefaultProtoParser::new().parse(&src, false).expect_err("unknown type should fail") {
        ParseError::UnknownType { rpc, ty } => {
            assert_eq!(rpc, "ping");
            assert_eq!(ty, "Ping");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn missing_source_is_an_io_error() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let err = DefaultProtoParser::new()
        .parse(&dir.path().join("absent.proto"), false)
        .expect_err("missing file should fail");
    assert!(matches!(err, ParseError::Io { .. }));
}

#[test]
fn file_without_service_is_rejected() {
    let dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let src = write(dir.path(), "types.proto", "syntax = \"proto3\";\nmessage A {}\n");
    match DefaultProtoParser::new().parse(&src, true).expect_err("no service should fail") {
        ParseError::ServiceCount { found, .. } => assert_eq!(found, 0),
        other => panic!("unexpected error: {:?}", other),
    }
}
