//! Weaviate Administration Domain Library
//!
//! Schema, tenant, data and backup administration for a Weaviate server,
//! built around a tenant fan-out executor that runs one data operation once
//! per tenant of a collection.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ CollectionService TenantService  DataService  Backup │  ← commands
//! └──────────────┬───────────────────────┬───────────────┘
//!                │                       │
//!                │               ┌───────▼───────┐
//!                │               │ TenantFanOut  │  ← resolve tenants,
//!                │               │               │    run TenantOperation
//!                │               └───────┬───────┘    per scope
//!                │                       │
//! ┌──────────────▼───────────────────────▼───────────────┐
//! │ CollectionClient  TenantClient  DataClient  Backup…  │  ← traits
//! └──────────────┬───────────────────────┬───────────────┘
//!                │                       │
//!      ┌─────────▼────────┐    ┌─────────▼────────┐
//!      │  WeaviateClient  │    │ InMemoryWeaviate │
//!      │  (REST/GraphQL)  │    │ (dev / testing)  │
//!      └──────────────────┘    └──────────────────┘
//! ```
//!
//! # Features
//!
//! - **Tenant fan-out**: auto tenant naming, query filtering of inactive
//!   tenants, continue-and-aggregate failure handling
//! - **Data**: random or file-based ingest, fetch/vector/keyword/hybrid
//!   query, merge or randomized update, delete
//! - **Schema**: collection create/update/delete with vector index,
//!   quantizer, vectorizer, replication and multi-tenancy settings
//! - **Tenants**: batch create, activity status changes, delete, counts
//! - **Backups**: create/restore with status polling, cancel
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_weaviate::{
//!     ConnectionConfig, ConsistencyLevel, DataService, FanOutRequest, IngestOptions,
//!     WeaviateClient,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(WeaviateClient::connect(ConnectionConfig::default()).await?);
//! let service = DataService::new(client.clone(), client.clone(), client);
//!
//! let request = FanOutRequest::new("Movies", 1000, ConsistencyLevel::Quorum).with_auto_tenants(10);
//! let report = service
//!     .ingest(IngestOptions {
//!         request,
//!         randomize: true,
//!         data_file: "movies.json".into(),
//!     })
//!     .await?;
//! println!("inserted {} objects", report.total());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod fanout;
pub mod generator;
pub mod memory;
pub mod models;
pub mod operations;
pub mod weaviate;

// Re-export commonly used types
pub use client::{BackupClient, CollectionClient, DataClient, TenantClient};
pub use error::{WeaviateError, WeaviateResult};
pub use fanout::{
    AUTO_TENANT_PREFIX, FanOutReport, FanOutRequest, OperationKind, TenantFanOut, TenantOperation,
    TenantOutcome, TenantPlan, auto_tenant_names,
};
pub use memory::InMemoryWeaviate;
pub use models::{
    BackupBackend, BackupDescriptor, BackupRequest, BackupStatus, CollectionConfig,
    ConsistencyLevel, CreateCollection, DataObject, MultiTenancyConfig, QueryObject,
    ReplicationConfig, ScopedCollection, SearchType, ServerVersion, Tenant, TenantActivityStatus,
    TenantScope, UpdateCollection, VectorIndexType, Vectorizer,
};
pub use operations::{
    BackupService, CollectionService, CollectionSummary, DataService, IngestOptions,
    QueryOptions, TenantBatch, TenantCounts, TenantQueryResult, TenantService,
    UpdateCollectionOptions, UpdateDataOptions,
};
pub use weaviate::{ConnectionConfig, WeaviateClient};
