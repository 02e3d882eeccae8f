//! Report persistence.
//!
//! A report is written once, as pretty-printed JSON, under
//! `agent-report-<timestamp>.json`. Writing the same name again overwrites.

use std::sync::Arc;

pub mod azure_blob;
pub mod local;

use crate::app_config::StorageConfig;
use crate::config::report_object_name;
use crate::errors::StorageError;
use crate::types::Report;

pub use azure_blob::{AzureBlobStore, ConnectionString};
pub use local::LocalDirStore;

#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    /// Upload the report and return the object name it was stored under.
    async fn persist(&self, report: &Report) -> Result<String, StorageError>;

    fn name(&self) -> &str;
}

/// Serialized form shared by every store.
pub fn encode_report(report: &Report) -> Result<(String, Vec<u8>), StorageError> {
    let body = serde_json::to_vec_pretty(report)?;
    Ok((report_object_name(&report.timestamp), body))
}

/// Blob storage when a connection string is configured, else the local directory.
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn ReportStore>, StorageError> {
    if let Some(conn) = &config.connection_string {
        let conn = ConnectionString::parse(conn)?;
        let store = AzureBlobStore::new(conn, config.container_name.clone(), config.timeout_secs)?;
        return Ok(Arc::new(store));
    }
    if let Some(dir) = &config.local_dir {
        return Ok(Arc::new(LocalDirStore::new(dir)));
    }
    Err(StorageError::NotConfigured)
}
