//! Capability traits over the database server.
//!
//! Operations and the fan-out executor only see these traits. The REST
//! adapter in [`crate::weaviate`] and the in-memory store in
//! [`crate::memory`] implement all four.

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::WeaviateResult;
use crate::models::{
    BackupDescriptor, BackupRequest, BatchOutcome, CollectionConfig, ConsistencyLevel,
    CreateCollection, DataObject, QueryObject, ScopedCollection, Tenant, UpdateCollection,
};

/// Schema management
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionClient: Send + Sync {
    async fn exists(&self, name: &str) -> WeaviateResult<bool>;

    /// Fails with `CollectionNotFound` when absent
    async fn get(&self, name: &str) -> WeaviateResult<CollectionConfig>;

    /// Names of every collection on the server
    async fn list_all(&self) -> WeaviateResult<Vec<String>>;

    async fn create(&self, input: CreateCollection) -> WeaviateResult<CollectionConfig>;

    async fn update(&self, name: &str, update: UpdateCollection)
    -> WeaviateResult<CollectionConfig>;

    async fn delete(&self, name: &str) -> WeaviateResult<()>;
}

/// Tenant management for multi-tenant collections
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantClient: Send + Sync {
    /// All tenants of `collection`.
    ///
    /// Returns `WeaviateError::MultiTenancyDisabled` when the collection is
    /// not multi-tenant.
    async fn get(&self, collection: &str) -> WeaviateResult<Vec<Tenant>>;

    /// Tenants matching `names`; unknown names are skipped
    async fn get_by_names(
        &self,
        collection: &str,
        names: Vec<String>,
    ) -> WeaviateResult<Vec<Tenant>>;

    async fn create(&self, collection: &str, tenants: Vec<Tenant>) -> WeaviateResult<()>;

    /// Change the activity status of existing tenants
    async fn update(&self, collection: &str, tenants: Vec<Tenant>) -> WeaviateResult<()>;

    async fn remove(&self, collection: &str, names: Vec<String>) -> WeaviateResult<()>;
}

/// Object reads and writes, each bound to a tenant scope
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataClient: Send + Sync {
    async fn batch_insert(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        objects: Vec<DataObject>,
    ) -> WeaviateResult<BatchOutcome>;

    /// First `limit` objects in storage order
    async fn fetch(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>>;

    /// nearText search
    async fn search_vector(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        query: &str,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>>;

    /// BM25 search
    async fn search_keyword(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        query: &str,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>>;

    async fn search_hybrid(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        query: &str,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>>;

    async fn aggregate_count(&self, target: &ScopedCollection) -> WeaviateResult<u64>;

    /// Merge `properties` into an existing object
    async fn update(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        id: Uuid,
        properties: Map<String, Value>,
    ) -> WeaviateResult<()>;

    /// Overwrite an object, vector included
    async fn replace(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        object: DataObject,
    ) -> WeaviateResult<()>;

    async fn delete_by_id(
        &self,
        target: &ScopedCollection,
        consistency: ConsistencyLevel,
        id: Uuid,
    ) -> WeaviateResult<()>;
}

/// Backup and restore against a storage backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackupClient: Send + Sync {
    async fn create(&self, request: BackupRequest) -> WeaviateResult<BackupDescriptor>;

    async fn create_status(
        &self,
        request: &BackupRequest,
    ) -> WeaviateResult<BackupDescriptor>;

    async fn restore(&self, request: BackupRequest) -> WeaviateResult<BackupDescriptor>;

    async fn restore_status(
        &self,
        request: &BackupRequest,
    ) -> WeaviateResult<BackupDescriptor>;

    /// `true` when the server accepted the cancellation
    async fn cancel(&self, request: &BackupRequest) -> WeaviateResult<bool>;
}
