//! Shared helpers for integration tests.
//!
//! Store files are written into a per-test `TempDir`, which removes them when
//! dropped, so keep the returned guard alive for the duration of the test.

#![allow(dead_code)]

pub mod fixtures;

use std::path::PathBuf;

use storeview::browser::BrowserSession;
use storeview::store::StoreWriter;
use storeview::value::{DateZone, ValueRenderer};
use tempfile::TempDir;

/// A store file on disk plus the directory that owns it.
pub struct TestStore {
    pub dir: TempDir,
    pub path: PathBuf,
}

/// Write `writer` to a fresh temp directory.
pub fn write_store(writer: &StoreWriter) -> TestStore {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("test.store");
    writer.write_to(&path).expect("write store");
    TestStore { dir, path }
}

/// Write raw bytes to a fresh temp directory.
pub fn write_raw(bytes: &[u8]) -> TestStore {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("raw.bin");
    std::fs::write(&path, bytes).expect("write file");
    TestStore { dir, path }
}

/// File-backed session that takes calendar days in UTC.
pub fn file_session() -> BrowserSession {
    BrowserSession::with_file_store(ValueRenderer::default().with_zone(DateZone::Utc))
}

/// Labels of the children of the root named `collection`.
pub fn root_child_labels(session: &BrowserSession, collection: &str) -> Vec<String> {
    let tree = session.tree();
    let root = tree.find_root(collection).expect("collection root");
    tree.child_labels(root).into_iter().map(str::to_string).collect()
}
