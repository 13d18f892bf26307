use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BackupBackend {
    #[default]
    S3,
    Gcs,
    Filesystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum BackupStatus {
    Started,
    Transferring,
    Transferred,
    Success,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl BackupStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BackupStatus::Success | BackupStatus::Failed | BackupStatus::Canceled
        )
    }
}

/// Selector shared by backup create and restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRequest {
    pub backend: BackupBackend,
    pub backup_id: String,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Only honoured by servers newer than 1.25.0.
    pub cpu_percentage: Option<u8>,
}

impl BackupRequest {
    pub fn new(backend: BackupBackend, backup_id: impl Into<String>) -> Self {
        Self {
            backend,
            backup_id: backup_id.into(),
            include: Vec::new(),
            exclude: Vec::new(),
            cpu_percentage: None,
        }
    }
}

/// Status of a backup or restore as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupDescriptor {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub status: BackupStatus,
    #[serde(default, rename = "classes")]
    pub collections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Split a comma separated CLI list, dropping blanks.
pub fn parse_collection_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
