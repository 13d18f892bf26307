//! Command implementations on top of the client traits.
//!
//! Data commands (`ingest`, `query`, `update`, `delete`) run through the
//! [`crate::fanout::TenantFanOut`]; schema, tenant and backup commands talk
//! to their client directly.

mod backup;
mod collections;
mod data;
mod delete_data;
mod ingest;
mod query;
mod tenants;
mod update_data;

pub use backup::{BackupService, DEFAULT_BACKUP_ID, DEFAULT_CPU_PERCENTAGE};
pub use collections::{CollectionService, CollectionSummary, UpdateCollectionOptions};
pub use data::{DEFAULT_DATA_FILE, DataService, IngestOptions, QueryOptions, UpdateDataOptions};
pub use delete_data::DeleteDataOperation;
pub use ingest::{BATCH_SIZE, IngestOperation, IngestSource};
pub use query::{QueryOperation, TenantQueryResult};
pub use tenants::{DEFAULT_TENANT_SUFFIX, TenantBatch, TenantCounts, TenantService, tenant_names};
pub use update_data::{UpdateDataOperation, UpdateMode};
