//! Storage builder and handles.
//!
//! Provides a builder pattern for opening both tier stores and a handles
//! struct that owns them for the duration of a unit of work.

use std::path::PathBuf;

use crate::storage::StorageError;
use crate::storage::adapter::SqliteRowStore;
use crate::storage::db::PoolSettings;
use crate::storage::types::Tier;

/// Builder for opening the edge and cloud row stores.
pub struct StorageBuilder {
    edge_url: String,
    cloud_url: String,
    edge_settings: PoolSettings,
    cloud_settings: PoolSettings,
}

impl StorageBuilder {
    /// Create a new storage builder from the two tier connection URLs.
    pub fn new(edge_url: impl Into<String>, cloud_url: impl Into<String>) -> Self {
        Self {
            edge_url: edge_url.into(),
            cloud_url: cloud_url.into(),
            edge_settings: PoolSettings::default(),
            cloud_settings: PoolSettings::default(),
        }
    }

    /// Set the pool settings for the edge tier.
    pub fn edge_settings(mut self, settings: PoolSettings) -> Self {
        self.edge_settings = settings;
        self
    }

    /// Set the pool settings for the cloud tier.
    pub fn cloud_settings(mut self, settings: PoolSettings) -> Self {
        self.cloud_settings = settings;
        self
    }

    /// Open both stores, creating database files and schema as needed.
    pub async fn build(self) -> Result<StorageHandles, StorageError> {
        if self.edge_url == self.cloud_url {
            return Err(StorageError::Internal(format!(
                "edge and cloud must be distinct databases, both are '{}'",
                self.edge_url
            )));
        }

        for url in [&self.edge_url, &self.cloud_url] {
            create_parent_dir(url)?;
        }

        let edge = SqliteRowStore::open(Tier::Edge, &self.edge_url, &self.edge_settings).await?;
        let cloud =
            SqliteRowStore::open(Tier::Cloud, &self.cloud_url, &self.cloud_settings).await?;

        tracing::info!(edge = %self.edge_url, cloud = %self.cloud_url, "Tier stores opened");
        Ok(StorageHandles { edge, cloud })
    }
}

/// Handles to both tier stores.
#[derive(Debug, Clone)]
pub struct StorageHandles {
    /// Size-bounded store holding the most recent rows.
    pub edge: SqliteRowStore,
    /// Unbounded store holding evicted rows.
    pub cloud: SqliteRowStore,
}

impl StorageHandles {
    /// Close both connection pools.
    pub async fn close(self) {
        self.edge.close().await;
        self.cloud.close().await;
        tracing::debug!("Tier stores closed");
    }
}

/// Filesystem path behind a `sqlite:` URL, if it names a file.
fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

fn create_parent_dir(url: &str) -> Result<(), StorageError> {
    if let Some(path) = sqlite_file_path(url)
        && let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            StorageError::Internal(format!(
                "Failed to create database directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RowStore;
    use crate::storage::types::Record;
    use tempfile::tempdir;

    #[test]
    fn test_sqlite_file_path() {
        assert_eq!(
            sqlite_file_path("sqlite:data/edge.db?mode=rwc"),
            Some(PathBuf::from("data/edge.db"))
        );
        assert_eq!(
            sqlite_file_path("sqlite:///tmp/cloud.db"),
            Some(PathBuf::from("/tmp/cloud.db"))
        );
        assert_eq!(sqlite_file_path("sqlite::memory:"), None);
        assert_eq!(sqlite_file_path("postgres://localhost/db"), None);
    }

    #[tokio::test]
    async fn test_storage_builder_opens_both_tiers() {
        let dir = tempdir().unwrap();
        let edge_url = format!("sqlite:{}", dir.path().join("nested/edge.db").display());
        let cloud_url = format!("sqlite:{}", dir.path().join("nested/cloud.db").display());

        let handles = StorageBuilder::new(&edge_url, &cloud_url)
            .edge_settings(PoolSettings {
                max_connections: 2,
                ..Default::default()
            })
            .build()
            .await
            .unwrap();

        assert_eq!(handles.edge.tier(), Tier::Edge);
        assert_eq!(handles.cloud.tier(), Tier::Cloud);

        handles
            .edge
            .bulk_insert(&[Record::new("2016-01-01 00:00:00", 1.0, 4, "")])
            .await
            .unwrap();
        assert_eq!(handles.edge.count().await.unwrap(), 1);
        assert_eq!(handles.cloud.count().await.unwrap(), 0);

        handles.close().await;
        assert!(dir.path().join("nested/edge.db").exists());
    }

    #[tokio::test]
    async fn test_storage_builder_rejects_same_database() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("same.db").display());

        let result = StorageBuilder::new(&url, &url).build().await;
        assert!(matches!(result, Err(StorageError::Internal(_))));
    }
}
