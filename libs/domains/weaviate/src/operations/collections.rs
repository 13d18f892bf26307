use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::client::{CollectionClient, DataClient, TenantClient};
use crate::error::{WeaviateError, WeaviateResult};
use crate::models::{
    CollectionConfig, CreateCollection, ScopedCollection, TenantScope, UpdateCollection,
    VectorIndexType,
};

/// Changes requested by `update collection`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCollectionOptions {
    pub description: Option<String>,
    pub vector_index: Option<VectorIndexType>,
    pub training_limit: u64,
    pub async_enabled: Option<bool>,
    pub auto_tenant_creation: Option<bool>,
    pub auto_tenant_activation: Option<bool>,
}

/// One row of the `get collection` overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    pub multi_tenancy: bool,
    pub tenants: Option<usize>,
    pub objects: u64,
    pub replication_factor: u32,
    pub vector_index: String,
    pub vectorizer: String,
}

pub struct CollectionService {
    collections: Arc<dyn CollectionClient>,
    tenants: Arc<dyn TenantClient>,
    data: Arc<dyn DataClient>,
}

impl CollectionService {
    pub fn new(
        collections: Arc<dyn CollectionClient>,
        tenants: Arc<dyn TenantClient>,
        data: Arc<dyn DataClient>,
    ) -> Self {
        Self {
            collections,
            tenants,
            data,
        }
    }

    async fn ensure_exists(&self, name: &str) -> WeaviateResult<()> {
        if self.collections.exists(name).await? {
            Ok(())
        } else {
            Err(WeaviateError::CollectionNotFound(name.to_string()))
        }
    }

    pub async fn create(&self, input: CreateCollection) -> WeaviateResult<CollectionConfig> {
        let name = input.name.clone();
        if self.collections.exists(&name).await? {
            return Err(WeaviateError::CollectionAlreadyExists(name));
        }

        let config = self.collections.create(input).await?;
        if !self.collections.exists(&name).await? {
            return Err(WeaviateError::Verification(format!(
                "collection {name} is missing after creation"
            )));
        }

        info!(
            collection = %name,
            vector_index = %config.vector_index.label(),
            multi_tenancy = config.multi_tenancy.enabled,
            "Collection created"
        );
        Ok(config)
    }

    pub async fn update(
        &self,
        name: &str,
        options: UpdateCollectionOptions,
    ) -> WeaviateResult<CollectionConfig> {
        self.ensure_exists(name).await?;
        let current = self.collections.get(name).await?;

        let vector_index = match options.vector_index {
            Some(preset) if !preset.is_reconfigurable() => {
                return Err(WeaviateError::Validation(format!(
                    "vector index {preset} cannot be applied to an existing collection"
                )));
            }
            Some(preset) => Some(preset.config(options.training_limit)),
            None => None,
        };

        let wants_tenant_flags =
            options.auto_tenant_creation.is_some() || options.auto_tenant_activation.is_some();
        let (auto_tenant_creation, auto_tenant_activation) = if current.multi_tenancy.enabled {
            (
                options
                    .auto_tenant_creation
                    .or(Some(current.multi_tenancy.auto_tenant_creation)),
                options
                    .auto_tenant_activation
                    .or(Some(current.multi_tenancy.auto_tenant_activation)),
            )
        } else {
            if wants_tenant_flags {
                warn!(
                    collection = name,
                    "Collection is not multi-tenant, ignoring auto tenant settings"
                );
            }
            (None, None)
        };

        let update = UpdateCollection {
            description: options.description,
            vector_index,
            async_replication: options.async_enabled,
            auto_tenant_creation,
            auto_tenant_activation,
        };
        if update.is_empty() {
            warn!(collection = name, "Nothing to update");
            return Ok(current);
        }

        let updated = self.collections.update(name, update).await?;
        info!(collection = name, "Collection updated");
        Ok(updated)
    }

    pub async fn delete(&self, name: &str) -> WeaviateResult<()> {
        self.ensure_exists(name).await?;
        self.collections.delete(name).await?;
        if self.collections.exists(name).await? {
            return Err(WeaviateError::Verification(format!(
                "collection {name} still exists after deletion"
            )));
        }
        info!(collection = name, "Collection deleted");
        Ok(())
    }

    /// Delete every collection on the server, returning how many were removed.
    pub async fn delete_all(&self) -> WeaviateResult<usize> {
        let names = self.collections.list_all().await?;
        for name in &names {
            self.collections.delete(name).await?;
            info!(collection = %name, "Collection deleted");
        }

        let remaining = self.collections.list_all().await?;
        if !remaining.is_empty() {
            return Err(WeaviateError::Verification(format!(
                "{} collections remain after deleting all",
                remaining.len()
            )));
        }
        Ok(names.len())
    }

    pub async fn describe(&self, name: &str) -> WeaviateResult<CollectionConfig> {
        self.ensure_exists(name).await?;
        self.collections.get(name).await
    }

    /// Overview of every collection. Object counts only include available
    /// tenants.
    pub async fn summaries(&self) -> WeaviateResult<Vec<CollectionSummary>> {
        let mut summaries = Vec::new();
        for name in self.collections.list_all().await? {
            let config = self.collections.get(&name).await?;

            let (tenants, objects) = if config.multi_tenancy.enabled {
                let tenants = self.tenants.get(&name).await?;
                let mut objects = 0;
                for tenant in tenants.iter().filter(|t| t.activity_status.is_available()) {
                    let target =
                        ScopedCollection::new(name.clone(), TenantScope::tenant(&tenant.name));
                    objects += self.data.aggregate_count(&target).await?;
                }
                (Some(tenants.len()), objects)
            } else {
                let target = ScopedCollection::unscoped(name.clone());
                (None, self.data.aggregate_count(&target).await?)
            };

            summaries.push(CollectionSummary {
                name,
                multi_tenancy: config.multi_tenancy.enabled,
                tenants,
                objects,
                replication_factor: config.replication.factor,
                vector_index: config.vector_index.label(),
                vectorizer: config.vectorizer,
            });
        }
        Ok(summaries)
    }
}
