//! Shared helpers for integration tests.

#![allow(dead_code)]

use edgetier::{Record, RowStore, ScanWindow, StorageBuilder, StorageHandles};
use tempfile::TempDir;

/// Open a fresh edge/cloud pair in a temporary directory.
///
/// The directory must outlive the handles.
pub async fn open_tiers() -> (TempDir, StorageHandles) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = |name: &str| format!("sqlite:{}", dir.path().join(name).display());

    let handles = StorageBuilder::new(url("edge.db"), url("cloud.db"))
        .build()
        .await
        .expect("Failed to build storage");

    (dir, handles)
}

/// Every record in a tier, oldest first.
pub async fn contents(store: &dyn RowStore) -> Vec<Record> {
    store
        .scan_ordered(ScanWindow::all())
        .await
        .expect("Failed to scan tier")
        .into_iter()
        .map(|stored| stored.record)
        .collect()
}
