//! Tenant fan-out: apply a single-tenant data operation to every applicable
//! tenant of a collection.
//!
//! Resolution order:
//!
//! 1. the collection must exist
//! 2. tenants are listed; a collection without multi-tenancy resolves to the
//!    single [`TenantScope::Unscoped`] entry
//! 3. an auto-tenant request of `N` appends `Tenant--{i}` names up to `N`
//!    (the server creates them on first write)
//! 4. queries only visit available (`ACTIVE`/`HOT`) tenants
//!
//! Every resolved scope is visited exactly once, in server order. A failing
//! tenant does not stop the loop; the first failure is reported afterwards
//! as [`WeaviateError::TenantOperationFailed`].

use std::sync::Arc;

use async_trait::async_trait;
use strum::Display;
use tracing::{error, info, warn};

use crate::client::{CollectionClient, TenantClient};
use crate::error::{WeaviateError, WeaviateResult};
use crate::models::{ConsistencyLevel, ScopedCollection, Tenant, TenantActivityStatus, TenantScope};

/// Prefix of tenant names synthesized for auto-tenant requests
pub const AUTO_TENANT_PREFIX: &str = "Tenant--";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum OperationKind {
    Ingest,
    Query,
    UpdateData,
    DeleteData,
}

/// A data operation against one tenant scope.
///
/// Returns the number of objects it handled.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantOperation: Send {
    fn kind(&self) -> OperationKind;

    async fn apply(
        &mut self,
        target: &ScopedCollection,
        limit: usize,
        consistency: ConsistencyLevel,
    ) -> WeaviateResult<usize>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutRequest {
    pub collection: String,
    pub limit: usize,
    pub consistency: ConsistencyLevel,
    pub auto_tenants: usize,
}

impl FanOutRequest {
    pub fn new(collection: impl Into<String>, limit: usize, consistency: ConsistencyLevel) -> Self {
        Self {
            collection: collection.into(),
            limit,
            consistency,
            auto_tenants: 0,
        }
    }

    pub fn with_auto_tenants(mut self, auto_tenants: usize) -> Self {
        self.auto_tenants = auto_tenants;
        self
    }
}

/// Resolved tenant list for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantPlan {
    pub collection: String,
    pub scopes: Vec<TenantScope>,
    pub limit: usize,
    pub consistency: ConsistencyLevel,
}

impl TenantPlan {
    pub fn is_multi_tenant(&self) -> bool {
        !matches!(self.scopes.as_slice(), [TenantScope::Unscoped])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantOutcome {
    pub scope: TenantScope,
    pub count: usize,
}

/// Per-tenant counts of a fully successful fan-out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub collection: String,
    pub outcomes: Vec<TenantOutcome>,
}

impl FanOutReport {
    pub fn total(&self) -> usize {
        self.outcomes.iter().map(|o| o.count).sum()
    }
}

/// Names appended when `requested` exceeds the `existing` tenant count.
pub fn auto_tenant_names(existing: usize, requested: usize) -> Vec<String> {
    (existing + 1..=requested)
        .map(|i| format!("{AUTO_TENANT_PREFIX}{i}"))
        .collect()
}

pub struct TenantFanOut {
    collections: Arc<dyn CollectionClient>,
    tenants: Arc<dyn TenantClient>,
}

impl TenantFanOut {
    pub fn new(collections: Arc<dyn CollectionClient>, tenants: Arc<dyn TenantClient>) -> Self {
        Self {
            collections,
            tenants,
        }
    }

    pub async fn resolve(
        &self,
        request: &FanOutRequest,
        kind: OperationKind,
    ) -> WeaviateResult<TenantPlan> {
        let collection = request.collection.as_str();
        if !self.collections.exists(collection).await? {
            return Err(WeaviateError::CollectionNotFound(collection.to_string()));
        }

        let plan = |scopes| TenantPlan {
            collection: collection.to_string(),
            scopes,
            limit: request.limit,
            consistency: request.consistency,
        };

        let mut tenants = match self.tenants.get(collection).await {
            Ok(tenants) => tenants,
            Err(err) if err.is_multi_tenancy_disabled() => {
                if request.auto_tenants > 0 {
                    warn!(
                        collection,
                        auto_tenants = request.auto_tenants,
                        "Collection is not multi-tenant, ignoring auto tenant request"
                    );
                }
                return Ok(plan(vec![TenantScope::Unscoped]));
            }
            Err(err) => return Err(err),
        };

        if request.auto_tenants > 0 {
            let config = self.collections.get(collection).await?;
            if !config.multi_tenancy.auto_tenant_creation {
                return Err(WeaviateError::AutoTenantNotEnabled(collection.to_string()));
            }
            let names = auto_tenant_names(tenants.len(), request.auto_tenants);
            if !names.is_empty() {
                info!(collection, added = names.len(), "Adding auto tenants");
            }
            tenants.extend(
                names
                    .into_iter()
                    .map(|name| Tenant::new(name, TenantActivityStatus::Active)),
            );
        }

        if kind == OperationKind::Query {
            let before = tenants.len();
            tenants.retain(|t| t.activity_status.is_available());
            if tenants.len() < before {
                info!(
                    collection,
                    skipped = before - tenants.len(),
                    "Skipping tenants that are not active"
                );
            }
        }

        if tenants.is_empty() {
            warn!(collection, "No tenants to process");
        }

        Ok(plan(
            tenants
                .into_iter()
                .map(|t| TenantScope::Tenant(t.name))
                .collect(),
        ))
    }

    pub async fn execute(
        &self,
        plan: &TenantPlan,
        operation: &mut dyn TenantOperation,
    ) -> WeaviateResult<FanOutReport> {
        let kind = operation.kind();
        let mut outcomes = Vec::with_capacity(plan.scopes.len());
        let mut first_failure: Option<WeaviateError> = None;
        let mut failed = 0usize;

        for scope in &plan.scopes {
            let target = ScopedCollection::new(plan.collection.clone(), scope.clone());
            info!(
                collection = %plan.collection,
                tenant = %scope,
                operation = %kind,
                "Processing tenant"
            );

            match operation
                .apply(&target, plan.limit, plan.consistency)
                .await
            {
                Ok(count) => {
                    info!(tenant = %scope, count, operation = %kind, "Tenant done");
                    outcomes.push(TenantOutcome {
                        scope: scope.clone(),
                        count,
                    });
                }
                Err(err) => {
                    error!(tenant = %scope, operation = %kind, error = %err, "Tenant failed");
                    failed += 1;
                    if first_failure.is_none() {
                        first_failure = Some(err.for_tenant(scope.to_string()));
                    }
                }
            }
        }

        if let Some(err) = first_failure {
            error!(
                collection = %plan.collection,
                failed,
                total = plan.scopes.len(),
                "Fan-out finished with failures"
            );
            return Err(err);
        }

        Ok(FanOutReport {
            collection: plan.collection.clone(),
            outcomes,
        })
    }

    /// Resolve the tenants for `request` and apply `operation` to each.
    pub async fn run(
        &self,
        request: &FanOutRequest,
        operation: &mut dyn TenantOperation,
    ) -> WeaviateResult<FanOutReport> {
        let plan = self.resolve(request, operation.kind()).await?;
        self.execute(&plan, operation).await
    }
}
