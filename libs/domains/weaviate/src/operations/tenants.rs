use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::client::{CollectionClient, TenantClient};
use crate::error::{WeaviateError, WeaviateResult};
use crate::models::{Tenant, TenantActivityStatus};

/// Default prefix of tenants created by `create tenants`
pub const DEFAULT_TENANT_SUFFIX: &str = "Tenant--";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantBatch {
    pub collection: String,
    pub suffix: String,
    pub count: usize,
    pub status: TenantActivityStatus,
}

/// Tenant counts by equivalence class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TenantCounts {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub offloaded: usize,
}

impl TenantCounts {
    pub fn from_tenants(tenants: &[Tenant]) -> Self {
        tenants.iter().fold(
            TenantCounts {
                total: tenants.len(),
                ..Default::default()
            },
            |mut counts, tenant| {
                let status = tenant.activity_status;
                if status.is_available() {
                    counts.active += 1;
                } else if status.is_paused() {
                    counts.inactive += 1;
                } else if status.is_archived() {
                    counts.offloaded += 1;
                }
                counts
            },
        )
    }
}

pub fn tenant_names(suffix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{suffix}{i}")).collect()
}

pub struct TenantService {
    collections: Arc<dyn CollectionClient>,
    tenants: Arc<dyn TenantClient>,
}

impl TenantService {
    pub fn new(collections: Arc<dyn CollectionClient>, tenants: Arc<dyn TenantClient>) -> Self {
        Self {
            collections,
            tenants,
        }
    }

    async fn ensure_multi_tenant(&self, collection: &str) -> WeaviateResult<()> {
        if !self.collections.exists(collection).await? {
            return Err(WeaviateError::CollectionNotFound(collection.to_string()));
        }
        let config = self.collections.get(collection).await?;
        if !config.multi_tenancy.enabled {
            return Err(WeaviateError::MultiTenancyDisabled(collection.to_string()));
        }
        Ok(())
    }

    /// Create `{suffix}0 .. {suffix}{count-1}` in a collection without tenants.
    pub async fn create(&self, batch: TenantBatch) -> WeaviateResult<Vec<Tenant>> {
        let collection = batch.collection.as_str();
        self.ensure_multi_tenant(collection).await?;

        if !self.tenants.get(collection).await?.is_empty() {
            return Err(WeaviateError::TenantsAlreadyExist(collection.to_string()));
        }

        let names = tenant_names(&batch.suffix, batch.count);
        let tenants = names
            .iter()
            .map(|name| Tenant::new(name.clone(), batch.status))
            .collect();
        self.tenants.create(collection, tenants).await?;

        let created = self.tenants.get_by_names(collection, names).await?;
        if created.len() != batch.count {
            return Err(WeaviateError::Verification(format!(
                "expected {} tenants in {collection}, found {}",
                batch.count,
                created.len()
            )));
        }
        for tenant in &created {
            if !tenant.activity_status.is_equivalent(batch.status) {
                warn!(
                    tenant = %tenant.name,
                    expected = %batch.status,
                    actual = %tenant.activity_status,
                    "Tenant status differs from requested"
                );
            }
        }

        info!(collection, created = created.len(), status = %batch.status, "Tenants created");
        Ok(created)
    }

    /// Move the first `count` tenants with the prefix to `status`, returning
    /// how many actually changed.
    pub async fn update(&self, batch: TenantBatch) -> WeaviateResult<usize> {
        let collection = batch.collection.as_str();
        self.ensure_multi_tenant(collection).await?;

        let matching: Vec<Tenant> = self
            .tenants
            .get(collection)
            .await?
            .into_iter()
            .filter(|t| t.name.starts_with(&batch.suffix))
            .collect();
        if matching.len() < batch.count {
            return Err(WeaviateError::NotEnoughTenants {
                collection: collection.to_string(),
                prefix: batch.suffix.clone(),
                expected: batch.count,
                found: matching.len(),
            });
        }

        let selected = &matching[..batch.count];
        let changes: Vec<Tenant> = selected
            .iter()
            .filter(|t| !t.activity_status.is_equivalent(batch.status))
            .map(|t| Tenant::new(t.name.clone(), batch.status))
            .collect();
        let changed = changes.len();
        if changes.is_empty() {
            info!(collection, status = %batch.status, "Tenants already in requested state");
        } else {
            self.tenants.update(collection, changes).await?;
        }

        let names = selected.iter().map(|t| t.name.clone()).collect();
        let current = self.tenants.get_by_names(collection, names).await?;
        if let Some(stale) = current
            .iter()
            .find(|t| !t.activity_status.is_equivalent(batch.status))
        {
            return Err(WeaviateError::Verification(format!(
                "tenant {} is {} instead of {}",
                stale.name, stale.activity_status, batch.status
            )));
        }

        info!(collection, changed, status = %batch.status, "Tenants updated");
        Ok(changed)
    }

    /// Remove `{suffix}0 .. {suffix}{n-1}` with `n` capped at the tenant
    /// count, returning how many existing tenants were removed. Fails with
    /// `NoTenants` when none of those names exist.
    pub async fn delete(&self, collection: &str, suffix: &str, count: usize) -> WeaviateResult<usize> {
        self.ensure_multi_tenant(collection).await?;

        let existing = self.tenants.get(collection).await?;
        if existing.is_empty() {
            return Err(WeaviateError::NoTenants(collection.to_string()));
        }

        let names = tenant_names(suffix, count.min(existing.len()));
        let present: HashSet<&str> = existing.iter().map(|t| t.name.as_str()).collect();
        let removed = names.iter().filter(|n| present.contains(n.as_str())).count();
        if removed == 0 {
            return Err(WeaviateError::NoTenants(collection.to_string()));
        }
        self.tenants.remove(collection, names).await?;

        let remaining = self.tenants.get(collection).await?.len();
        let expected = existing.len() - removed;
        if remaining != expected {
            return Err(WeaviateError::Verification(format!(
                "expected {expected} tenants left in {collection}, found {remaining}"
            )));
        }

        info!(collection, removed, remaining, "Tenants deleted");
        Ok(removed)
    }

    pub async fn list(&self, collection: &str) -> WeaviateResult<Vec<Tenant>> {
        if !self.collections.exists(collection).await? {
            return Err(WeaviateError::CollectionNotFound(collection.to_string()));
        }
        self.tenants.get(collection).await
    }
}
