//! JSON-file-backed backend
//!
//! Keeps the same maps as the volatile backend and rewrites the whole file on
//! `save_all` and on every scheduler flush. Writes go to a sibling temp file
//! that is then renamed over the target.

use super::memory::MemoryStorage;
use super::{MetricStorage, StorageKind};
use crate::core::metric::{MetricUpdate, MetricValue, MetricsSnapshot};
use crate::utils::error::{MetricsError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// File-backed metric store
#[derive(Debug)]
pub struct DiskStorage {
    path: PathBuf,
    memory: MemoryStorage,
    write_lock: Mutex<()>,
}

impl DiskStorage {
    /// Open the store at `path`, loading the previous snapshot if `restore` is set.
    ///
    /// A missing or unreadable snapshot is not fatal: the store starts empty.
    pub async fn open(path: impl Into<PathBuf>, restore: bool) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MetricsError::storage(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let snapshot = if restore {
            match load_snapshot(&path).await {
                Ok(Some(snapshot)) => {
                    info!(
                        "Restored {} metrics from {}",
                        snapshot.len(),
                        path.display()
                    );
                    snapshot
                }
                Ok(None) => {
                    info!("No snapshot at {}, starting empty", path.display());
                    MetricsSnapshot::default()
                }
                Err(e) => {
                    warn!("Failed to restore {}: {}, starting empty", path.display(), e);
                    MetricsSnapshot::default()
                }
            }
        } else {
            MetricsSnapshot::default()
        };

        Ok(Self {
            path,
            memory: MemoryStorage::with_snapshot(snapshot),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_file(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let bytes = serde_json::to_vec(&self.memory.snapshot())?;
        let tmp_path = temp_path(&self.path);

        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path).await?;
        debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn load_snapshot(path: &Path) -> Result<Option<MetricsSnapshot>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&bytes)?))
}

#[async_trait]
impl MetricStorage for DiskStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Disk
    }

    async fn save_gauge(&self, id: &str, value: f64) -> Result<()> {
        let update = MetricUpdate::new(id, MetricValue::Gauge(value))?;
        self.memory.save_gauge(&update.id, value).await
    }

    async fn get_gauge(&self, id: &str) -> Result<Option<f64>> {
        self.memory.get_gauge(id).await
    }

    async fn save_counter(&self, id: &str, total: i64) -> Result<()> {
        self.memory.save_counter(id, total).await
    }

    async fn get_counter(&self, id: &str) -> Result<Option<i64>> {
        self.memory.get_counter(id).await
    }

    async fn get_all(&self) -> Result<MetricsSnapshot> {
        self.memory.get_all().await
    }

    async fn save_all(&self, updates: &[MetricUpdate]) -> Result<()> {
        self.memory.apply(updates);
        self.write_file().await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.write_file().await
    }
}
