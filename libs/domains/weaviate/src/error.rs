use core_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeaviateError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Collection already exists: {0}")]
    CollectionAlreadyExists(String),

    /// The collection is not multi-tenant. The fan-out executor treats this as
    /// the "unscoped" case, every other caller surfaces it.
    #[error("Multi-tenancy is not enabled for collection {0}")]
    MultiTenancyDisabled(String),

    #[error("Auto tenant creation is not enabled for collection {0}")]
    AutoTenantNotEnabled(String),

    #[error("Operation failed for tenant {tenant}: {cause}")]
    TenantOperationFailed {
        tenant: String,
        #[source]
        cause: Box<WeaviateError>,
    },

    #[error("Tenants already exist in collection {0}, delete them before creating new ones")]
    TenantsAlreadyExist(String),

    #[error(
        "Collection {collection} has {found} tenants with prefix '{prefix}', {expected} required"
    )]
    NotEnoughTenants {
        collection: String,
        prefix: String,
        expected: usize,
        found: usize,
    },

    #[error("No tenants present in collection {0}")]
    NoTenants(String),

    #[error("No objects found in {0}")]
    NoObjects(String),

    #[error("Expected {expected} objects but found {found}")]
    ObjectCountMismatch { expected: usize, found: usize },

    #[error("Batch insert failed for {failed} of {total} objects: {first_error}")]
    BatchFailed {
        failed: usize,
        total: usize,
        first_error: String,
    },

    #[error("Backup {backup_id} finished with status {status}")]
    BackupFailed { backup_id: String, status: String },

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Cannot load data file {path}: {message}")]
    DataFile { path: String, message: String },

    #[error("Request failed{}: {message}", status_suffix(.status))]
    BackendRequestFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type WeaviateResult<T> = Result<T, WeaviateError>;

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl WeaviateError {
    pub fn backend(message: impl Into<String>) -> Self {
        WeaviateError::BackendRequestFailed {
            status: None,
            message: message.into(),
        }
    }

    /// Wrap `self` as the failure of a single tenant during fan-out.
    pub fn for_tenant(self, tenant: impl Into<String>) -> Self {
        WeaviateError::TenantOperationFailed {
            tenant: tenant.into(),
            cause: Box::new(self),
        }
    }

    pub fn is_multi_tenancy_disabled(&self) -> bool {
        matches!(self, WeaviateError::MultiTenancyDisabled(_))
    }
}

impl From<reqwest::Error> for WeaviateError {
    fn from(err: reqwest::Error) -> Self {
        WeaviateError::BackendRequestFailed {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for WeaviateError {
    fn from(err: serde_json::Error) -> Self {
        WeaviateError::Serialization(err.to_string())
    }
}

impl From<ConfigError> for WeaviateError {
    fn from(err: ConfigError) -> Self {
        WeaviateError::Config(err.to_string())
    }
}
