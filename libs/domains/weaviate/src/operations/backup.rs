use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::client::{BackupClient, CollectionClient};
use crate::error::{WeaviateError, WeaviateResult};
use crate::models::{BackupDescriptor, BackupRequest, BackupStatus};

pub const DEFAULT_BACKUP_ID: &str = "test-backup";
pub const DEFAULT_CPU_PERCENTAGE: u8 = 40;

pub struct BackupService {
    backups: Arc<dyn BackupClient>,
    collections: Arc<dyn CollectionClient>,
    poll_interval: Duration,
}

impl BackupService {
    pub fn new(backups: Arc<dyn BackupClient>, collections: Arc<dyn CollectionClient>) -> Self {
        Self {
            backups,
            collections,
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub async fn create(
        &self,
        request: BackupRequest,
        wait: bool,
    ) -> WeaviateResult<BackupDescriptor> {
        for name in request.include.iter().chain(&request.exclude) {
            if !self.collections.exists(name).await? {
                return Err(WeaviateError::CollectionNotFound(name.clone()));
            }
        }

        let started = self.backups.create(request.clone()).await?;
        info!(backup_id = %started.id, backend = %request.backend, status = %started.status, "Backup started");
        if !wait {
            return Ok(started);
        }

        let finished = self.wait_until_done(&request, false).await?;
        ensure_success(&request.backup_id, finished)
    }

    pub async fn restore(
        &self,
        request: BackupRequest,
        wait: bool,
    ) -> WeaviateResult<BackupDescriptor> {
        let started = self.backups.restore(request.clone()).await?;
        info!(backup_id = %started.id, backend = %request.backend, status = %started.status, "Restore started");
        if !wait {
            return Ok(started);
        }

        let finished = self.wait_until_done(&request, true).await?;
        ensure_success(&request.backup_id, finished)
    }

    /// Status of a backup, or of its restore when `restore` is set.
    pub async fn status(
        &self,
        request: &BackupRequest,
        restore: bool,
    ) -> WeaviateResult<BackupDescriptor> {
        if restore {
            self.backups.restore_status(request).await
        } else {
            self.backups.create_status(request).await
        }
    }

    pub async fn cancel(&self, request: &BackupRequest) -> WeaviateResult<bool> {
        let cancelled = self.backups.cancel(request).await?;
        info!(backup_id = %request.backup_id, cancelled, "Backup cancel requested");
        Ok(cancelled)
    }

    async fn wait_until_done(
        &self,
        request: &BackupRequest,
        restore: bool,
    ) -> WeaviateResult<BackupDescriptor> {
        loop {
            let descriptor = self.status(request, restore).await?;
            if descriptor.status.is_terminal() {
                return Ok(descriptor);
            }
            debug!(backup_id = %request.backup_id, status = %descriptor.status, "Waiting for backup");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn ensure_success(backup_id: &str, descriptor: BackupDescriptor) -> WeaviateResult<BackupDescriptor> {
    if descriptor.status == BackupStatus::Success {
        Ok(descriptor)
    } else {
        Err(WeaviateError::BackupFailed {
            backup_id: backup_id.to_string(),
            status: descriptor.status.to_string(),
        })
    }
}
