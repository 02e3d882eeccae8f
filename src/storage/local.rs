use std::path::{Path, PathBuf};

use crate::errors::StorageError;
use crate::types::Report;

use super::{ReportStore, encode_report};

/// Writes reports into a directory on disk. Meant for local runs without a
/// storage account.
pub struct LocalDirStore {
    dir: PathBuf,
}

impl LocalDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl ReportStore for LocalDirStore {
    async fn persist(&self, report: &Report) -> Result<String, StorageError> {
        let (name, body) = encode_report(report)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&name);
        tokio::fs::write(&path, body).await?;
        log::info!("report written to {}", path.display());
        Ok(name)
    }

    fn name(&self) -> &str {
        "local-dir"
    }
}
