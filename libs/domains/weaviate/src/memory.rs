use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::client::{BackupClient, CollectionClient, DataClient, TenantClient};
use crate::error::{WeaviateError, WeaviateResult};
use crate::models::{
    BackupDescriptor, BackupRequest, BackupStatus, BatchFailure, BatchOutcome, CollectionConfig,
    ConsistencyLevel, CreateCollection, DataObject, QueryObject, ScopedCollection, Tenant,
    TenantActivityStatus, UpdateCollection,
};

/// In-memory server (for development/testing).
///
/// Mirrors the server behaviour the commands depend on: multi-tenant
/// collections reject unscoped access, inactive tenants reject reads and
/// writes unless auto activation is on, batch writes to unknown tenants
/// create them when auto tenant creation is on, and backups complete
/// immediately. Search ranks objects by how many query words appear in
/// their text properties.
#[derive(Debug, Default, Clone)]
pub struct InMemoryWeaviate {
    state: Arc<RwLock<State>>,
}

#[derive(Debug, Default)]
struct State {
    collections: BTreeMap<String, StoredCollection>,
    backups: HashMap<String, StoredBackup>,
    restores: HashMap<String, BackupDescriptor>,
}

#[derive(Debug, Clone)]
struct StoredCollection {
    config: CollectionConfig,
    tenants: Vec<Tenant>,
    objects: HashMap<Option<String>, Vec<DataObject>>,
}

#[derive(Debug, Clone)]
struct StoredBackup {
    descriptor: BackupDescriptor,
    snapshot: Vec<StoredCollection>,
}

fn unprocessable(message: String) -> WeaviateError {
    WeaviateError::BackendRequestFailed {
        status: Some(422),
        message,
    }
}

fn not_found(message: String) -> WeaviateError {
    WeaviateError::BackendRequestFailed {
        status: Some(404),
        message,
    }
}

fn backup_key(request: &BackupRequest) -> String {
    format!("{}/{}", request.backend, request.backup_id)
}

impl State {
    fn collection(&self, name: &str) -> WeaviateResult<&StoredCollection> {
        self.collections
            .get(name)
            .ok_or_else(|| WeaviateError::CollectionNotFound(name.to_string()))
    }

    fn collection_mut(&mut self, name: &str) -> WeaviateResult<&mut StoredCollection> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| WeaviateError::CollectionNotFound(name.to_string()))
    }

    fn multi_tenant(&self, name: &str) -> WeaviateResult<&StoredCollection> {
        let stored = self.collection(name)?;
        if !stored.config.multi_tenancy.enabled {
            return Err(WeaviateError::MultiTenancyDisabled(name.to_string()));
        }
        Ok(stored)
    }

    fn multi_tenant_mut(&mut self, name: &str) -> WeaviateResult<&mut StoredCollection> {
        let stored = self.collection_mut(name)?;
        if !stored.config.multi_tenancy.enabled {
            return Err(WeaviateError::MultiTenancyDisabled(name.to_string()));
        }
        Ok(stored)
    }

    /// Objects of one scope. `writing` allows auto tenant creation.
    fn objects_mut(
        &mut self,
        target: &ScopedCollection,
        writing: bool,
    ) -> WeaviateResult<&mut Vec<DataObject>> {
        let stored = self.collection_mut(&target.collection)?;
        let multi_tenancy = stored.config.multi_tenancy;

        match (multi_tenancy.enabled, target.tenant()) {
            (true, None) => {
                return Err(unprocessable(format!(
                    "class {} has multi-tenancy enabled, but request was without tenant",
                    target.collection
                )));
            }
            (false, Some(_)) => {
                return Err(unprocessable(format!(
                    "class {} has multi-tenancy disabled, but request was with tenant",
                    target.collection
                )));
            }
            (true, Some(name)) => {
                match stored.tenants.iter_mut().find(|t| t.name == name) {
                    Some(tenant) if !tenant.activity_status.is_available() => {
                        if !multi_tenancy.auto_tenant_activation {
                            return Err(unprocessable(format!(
                                "tenant {name} is not active: {}",
                                tenant.activity_status
                            )));
                        }
                        tenant.activity_status = TenantActivityStatus::Active;
                    }
                    Some(_) => {}
                    None if writing && multi_tenancy.auto_tenant_creation => {
                        stored
                            .tenants
                            .push(Tenant::new(name, TenantActivityStatus::Active));
                    }
                    None => return Err(unprocessable(format!("tenant not found: {name}"))),
                }
            }
            (false, None) => {}
        }

        Ok(stored
            .objects
            .entry(target.tenant().map(str::to_string))
            .or_default())
    }
}

fn config_from(input: CreateCollection) -> CollectionConfig {
    CollectionConfig {
        name: input.name,
        description: input.description,
        properties: input.properties,
        vector_index: input.vector_index,
        vectorizer: input
            .vectorizer
            .map_or("none", |v| v.module_name())
            .to_string(),
        replication: input.replication,
        shards: input.shards.max(1),
        multi_tenancy: input.multi_tenancy,
    }
}

/// Number of query words found in the object's string properties.
fn relevance(object: &DataObject, query: &str) -> usize {
    let text = object
        .properties
        .values()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    query
        .split_whitespace()
        .filter(|word| text.contains(&word.to_lowercase()))
        .count()
}

fn ranked<'a>(objects: &'a [DataObject], query: &str) -> Vec<(usize, &'a DataObject)> {
    let mut ranked: Vec<_> = objects.iter().map(|o| (relevance(o, query), o)).collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked
}

fn query_object(object: &DataObject) -> QueryObject {
    QueryObject::new(object.id, object.properties.clone())
}

impl InMemoryWeaviate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects stored for a scope, in insertion order. Test helper that skips
    /// tenant activity checks.
    pub async fn objects(&self, target: &ScopedCollection) -> Vec<DataObject> {
        let state = self.state.read().await;
        state
            .collections
            .get(&target.collection)
            .and_then(|c| c.objects.get(&target.tenant().map(str::to_string)))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CollectionClient for InMemoryWeaviate {
    async fn exists(&self, name: &str) -> WeaviateResult<bool> {
        Ok(self.state.read().await.collections.contains_key(name))
    }

    async fn get(&self, name: &str) -> WeaviateResult<CollectionConfig> {
        Ok(self.state.read().await.collection(name)?.config.clone())
    }

    async fn list_all(&self) -> WeaviateResult<Vec<String>> {
        Ok(self.state.read().await.collections.keys().cloned().collect())
    }

    async fn create(&self, input: CreateCollection) -> WeaviateResult<CollectionConfig> {
        let mut state = self.state.write().await;
        if state.collections.contains_key(&input.name) {
            return Err(unprocessable(format!("class name {} already exists", input.name)));
        }
        let config = config_from(input);
        state.collections.insert(
            config.name.clone(),
            StoredCollection {
                config: config.clone(),
                tenants: Vec::new(),
                objects: HashMap::new(),
            },
        );
        tracing::info!(collection = %config.name, "Created collection in memory");
        Ok(config)
    }

    async fn update(
        &self,
        name: &str,
        update: UpdateCollection,
    ) -> WeaviateResult<CollectionConfig> {
        let mut state = self.state.write().await;
        let config = &mut state.collection_mut(name)?.config;

        if let Some(description) = update.description {
            config.description = Some(description);
        }
        if let Some(index) = update.vector_index {
            config.vector_index = index;
        }
        if let Some(async_enabled) = update.async_replication {
            config.replication.async_enabled = async_enabled;
        }
        if let Some(creation) = update.auto_tenant_creation {
            config.multi_tenancy.auto_tenant_creation = creation;
        }
        if let Some(activation) = update.auto_tenant_activation {
            config.multi_tenancy.auto_tenant_activation = activation;
        }
        Ok(config.clone())
    }

    async fn delete(&self, name: &str) -> WeaviateResult<()> {
        self.state.write().await.collections.remove(name);
        Ok(())
    }
}

#[async_trait]
impl TenantClient for InMemoryWeaviate {
    async fn get(&self, collection: &str) -> WeaviateResult<Vec<Tenant>> {
        Ok(self.state.read().await.multi_tenant(collection)?.tenants.clone())
    }

    async fn get_by_names(
        &self,
        collection: &str,
        names: Vec<String>,
    ) -> WeaviateResult<Vec<Tenant>> {
        let state = self.state.read().await;
        Ok(state
            .multi_tenant(collection)?
            .tenants
            .iter()
            .filter(|t| names.contains(&t.name))
            .cloned()
            .collect())
    }

    async fn create(&self, collection: &str, tenants: Vec<Tenant>) -> WeaviateResult<()> {
        let mut state = self.state.write().await;
        let stored = state.multi_tenant_mut(collection)?;
        for tenant in tenants {
            if stored.tenants.iter().any(|t| t.name == tenant.name) {
                return Err(unprocessable(format!("tenant {} already exists", tenant.name)));
            }
            stored.tenants.push(tenant);
        }
        Ok(())
    }

    async fn update(&self, collection: &str, tenants: Vec<Tenant>) -> WeaviateResult<()> {
        let mut state = self.state.write().await;
        let stored = state.multi_tenant_mut(collection)?;
        for update in tenants {
            let tenant = stored
                .tenants
                .iter_mut()
                .find(|t| t.name == update.name)
                .ok_or_else(|| unprocessable(format!("tenant not found: {}", update.name)))?;
            tenant.activity_status = update.activity_status.canonical();
        }
        Ok(())
    }

    async fn remove(&self, collection: &str, names: Vec<String>) -> WeaviateResult<()> {
        let mut state = self.state.write().await;
        let stored = state.multi_tenant_mut(collection)?;
        stored.tenants.retain(|t| !names.contains(&t.name));
        stored
            .objects
            .retain(|tenant, _| tenant.as_ref().is_none_or(|t| !names.contains(t)));
        Ok(())
    }
}

#[async_trait]
impl DataClient for InMemoryWeaviate {
    async fn batch_insert(
        &self,
        target: &ScopedCollection,
        _consistency: ConsistencyLevel,
        objects: Vec<DataObject>,
    ) -> WeaviateResult<BatchOutcome> {
        let mut state = self.state.write().await;
        let stored = match state.objects_mut(target, true) {
            Ok(stored) => stored,
            Err(err @ WeaviateError::CollectionNotFound(_)) => return Err(err),
            Err(err) => {
                let message = err.to_string();
                return Ok(BatchOutcome {
                    inserted: 0,
                    failures: objects
                        .iter()
                        .map(|o| BatchFailure {
                            id: Some(o.id),
                            message: message.clone(),
                        })
                        .collect(),
                });
            }
        };

        let inserted = objects.len();
        for object in objects {
            match stored.iter_mut().find(|o| o.id == object.id) {
                Some(existing) => *existing = object,
                None => stored.push(object),
            }
        }
        Ok(BatchOutcome {
            inserted,
            failures: Vec::new(),
        })
    }

    async fn fetch(
        &self,
        target: &ScopedCollection,
        _consistency: ConsistencyLevel,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>> {
        let mut state = self.state.write().await;
        let stored = state.objects_mut(target, false)?;
        Ok(stored.iter().take(limit).map(query_object).collect())
    }

    async fn search_vector(
        &self,
        target: &ScopedCollection,
        _consistency: ConsistencyLevel,
        query: &str,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>> {
        let mut state = self.state.write().await;
        let stored = state.objects_mut(target, false)?;
        Ok(ranked(stored, query)
            .into_iter()
            .take(limit)
            .map(|(hits, object)| {
                let distance = 1.0 / (1.0 + hits as f64);
                let mut result = query_object(object);
                result.distance = Some(distance);
                result.certainty = Some(1.0 - distance / 2.0);
                result
            })
            .collect())
    }

    async fn search_keyword(
        &self,
        target: &ScopedCollection,
        _consistency: ConsistencyLevel,
        query: &str,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>> {
        let mut state = self.state.write().await;
        let stored = state.objects_mut(target, false)?;
        Ok(ranked(stored, query)
            .into_iter()
            .filter(|(hits, _)| *hits > 0)
            .take(limit)
            .map(|(hits, object)| {
                let mut result = query_object(object);
                result.score = Some(hits as f64);
                result
            })
            .collect())
    }

    async fn search_hybrid(
        &self,
        target: &ScopedCollection,
        _consistency: ConsistencyLevel,
        query: &str,
        limit: usize,
    ) -> WeaviateResult<Vec<QueryObject>> {
        let mut state = self.state.write().await;
        let stored = state.objects_mut(target, false)?;
        let words = query.split_whitespace().count().max(1) as f64;
        Ok(ranked(stored, query)
            .into_iter()
            .take(limit)
            .map(|(hits, object)| {
                let mut result = query_object(object);
                result.score = Some(hits as f64 / words);
                result
            })
            .collect())
    }

    async fn aggregate_count(&self, target: &ScopedCollection) -> WeaviateResult<u64> {
        let mut state = self.state.write().await;
        Ok(state.objects_mut(target, false)?.len() as u64)
    }

    async fn update(
        &self,
        target: &ScopedCollection,
        _consistency: ConsistencyLevel,
        id: Uuid,
        properties: Map<String, Value>,
    ) -> WeaviateResult<()> {
        let mut state = self.state.write().await;
        let object = state
            .objects_mut(target, false)?
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| not_found(format!("object {id} not found in {target}")))?;
        object.properties.extend(properties);
        Ok(())
    }

    async fn replace(
        &self,
        target: &ScopedCollection,
        _consistency: ConsistencyLevel,
        object: DataObject,
    ) -> WeaviateResult<()> {
        let mut state = self.state.write().await;
        let existing = state
            .objects_mut(target, false)?
            .iter_mut()
            .find(|o| o.id == object.id)
            .ok_or_else(|| not_found(format!("object {} not found in {target}", object.id)))?;
        *existing = object;
        Ok(())
    }

    async fn delete_by_id(
        &self,
        target: &ScopedCollection,
        _consistency: ConsistencyLevel,
        id: Uuid,
    ) -> WeaviateResult<()> {
        let mut state = self.state.write().await;
        let objects = state.objects_mut(target, false)?;
        let before = objects.len();
        objects.retain(|o| o.id != id);
        if objects.len() == before {
            return Err(not_found(format!("object {id} not found in {target}")));
        }
        Ok(())
    }
}

#[async_trait]
impl BackupClient for InMemoryWeaviate {
    async fn create(&self, request: BackupRequest) -> WeaviateResult<BackupDescriptor> {
        let mut state = self.state.write().await;
        let key = backup_key(&request);
        if state.backups.contains_key(&key) {
            return Err(unprocessable(format!(
                "backup {} already exists",
                request.backup_id
            )));
        }

        let snapshot: Vec<StoredCollection> = state
            .collections
            .values()
            .filter(|c| request.include.is_empty() || request.include.contains(&c.config.name))
            .filter(|c| !request.exclude.contains(&c.config.name))
            .cloned()
            .collect();
        let descriptor = BackupDescriptor {
            id: request.backup_id.clone(),
            backend: Some(request.backend.to_string()),
            path: Some(format!("{}://backups/{}", request.backend, request.backup_id)),
            status: BackupStatus::Success,
            collections: snapshot.iter().map(|c| c.config.name.clone()).collect(),
            error: None,
        };
        state.backups.insert(
            key,
            StoredBackup {
                descriptor: descriptor.clone(),
                snapshot,
            },
        );

        Ok(BackupDescriptor {
            status: BackupStatus::Started,
            ..descriptor
        })
    }

    async fn create_status(&self, request: &BackupRequest) -> WeaviateResult<BackupDescriptor> {
        self.state
            .read()
            .await
            .backups
            .get(&backup_key(request))
            .map(|b| b.descriptor.clone())
            .ok_or_else(|| not_found(format!("backup {} not found", request.backup_id)))
    }

    async fn restore(&self, request: BackupRequest) -> WeaviateResult<BackupDescriptor> {
        let mut state = self.state.write().await;
        let key = backup_key(&request);
        let backup = state
            .backups
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found(format!("backup {} not found", request.backup_id)))?;

        let restored: Vec<StoredCollection> = backup
            .snapshot
            .into_iter()
            .filter(|c| request.include.is_empty() || request.include.contains(&c.config.name))
            .filter(|c| !request.exclude.contains(&c.config.name))
            .collect();
        if let Some(existing) = restored
            .iter()
            .find(|c| state.collections.contains_key(&c.config.name))
        {
            return Err(unprocessable(format!(
                "cannot restore class {}: class already exists",
                existing.config.name
            )));
        }

        let descriptor = BackupDescriptor {
            collections: restored.iter().map(|c| c.config.name.clone()).collect(),
            ..backup.descriptor
        };
        for collection in restored {
            state
                .collections
                .insert(collection.config.name.clone(), collection);
        }
        state.restores.insert(key, descriptor.clone());

        Ok(BackupDescriptor {
            status: BackupStatus::Started,
            ..descriptor
        })
    }

    async fn restore_status(&self, request: &BackupRequest) -> WeaviateResult<BackupDescriptor> {
        self.state
            .read()
            .await
            .restores
            .get(&backup_key(request))
            .cloned()
            .ok_or_else(|| not_found(format!("restore of {} not found", request.backup_id)))
    }

    async fn cancel(&self, request: &BackupRequest) -> WeaviateResult<bool> {
        Ok(self
            .state
            .read()
            .await
            .backups
            .contains_key(&backup_key(request)))
    }
}
