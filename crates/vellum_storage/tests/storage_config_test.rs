//! Tests for backend configuration.

use std::io::Write;
use tempfile::{Builder, TempDir};
use vellum_error::VellumErrorKind;
use vellum_storage::{BackendKind, ReplacePolicy, VellumConfig};

#[test]
fn test_load_bundled_defaults() {
    let config = VellumConfig::load().unwrap();

    assert!(config.store.copy_chunk_size > 0);
    assert!(!config.document.bucket.is_empty());
}

#[test]
fn test_defaults_match_bundled_file() {
    let config = VellumConfig::default();
    assert_eq!(config.store.backend, BackendKind::Filesystem);
    assert!(!config.store.serialize_writes);
    assert_eq!(config.store.copy_chunk_size, 64 * 1024);
    assert_eq!(config.document.bucket, "fs");
    assert_eq!(config.document.chunk_size, 255 * 1024);
}

#[test]
fn test_config_from_file() {
    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        temp_file,
        r#"
[store]
backend = "document"
serialize_writes = true

[document]
bucket = "claim_forms"
"#
    )
    .unwrap();

    let config = VellumConfig::from_file(temp_file.path()).unwrap();
    assert_eq!(config.store.backend, BackendKind::Document);
    assert!(config.store.serialize_writes);
    assert_eq!(config.store.copy_chunk_size, 64 * 1024);
    assert_eq!(config.document.bucket, "claim_forms");
}

#[test]
fn test_unknown_backend_is_rejected() {
    let mut temp_file = Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(temp_file, "[store]\nbackend = \"tape\"").unwrap();

    let err = VellumConfig::from_file(temp_file.path()).unwrap_err();
    assert!(matches!(err.kind(), VellumErrorKind::Config(_)));
}

#[test]
fn test_zero_chunk_size_is_rejected() {
    let mut config = VellumConfig::default();
    config.store.copy_chunk_size = 0;

    let err = config.validate().unwrap_err();
    assert!(matches!(err.kind(), VellumErrorKind::Config(_)));
}

#[test]
fn test_build_filesystem_resolver() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = VellumConfig::default();
    config.filesystem.root = temp_dir.path().join("content");

    let resolver = config.build_resolver().unwrap();
    assert_eq!(resolver.backend(), BackendKind::Filesystem);
    assert_eq!(resolver.replace_policy(), ReplacePolicy::InPlace);
    assert!(temp_dir.path().join("content").is_dir());
}

#[tokio::test]
async fn test_build_read_only_filesystem_resolver() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = VellumConfig::default();
    config.filesystem.root = temp_dir.path().to_path_buf();
    config.filesystem.read_only = true;

    let resolver = config.build_resolver().unwrap();
    let resource = resolver.resolve("form").await.unwrap();
    assert!(!resource.capabilities().writable);
}

#[test]
fn test_build_document_resolver() {
    let mut config = VellumConfig::default();
    config.store.backend = BackendKind::Document;

    let resolver = config.build_resolver().unwrap();
    assert_eq!(resolver.backend(), BackendKind::Document);
    assert_eq!(resolver.replace_policy(), ReplacePolicy::DeleteBeforeWrite);
}
