use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::client::DataClient;
use crate::error::WeaviateResult;
use crate::fanout::{OperationKind, TenantOperation};
use crate::models::{ConsistencyLevel, ScopedCollection};

/// Deletes up to `limit` objects per tenant, one by one.
pub struct DeleteDataOperation {
    data: Arc<dyn DataClient>,
}

impl DeleteDataOperation {
    pub fn new(data: Arc<dyn DataClient>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl TenantOperation for DeleteDataOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::DeleteData
    }

    async fn apply(
        &mut self,
        target: &ScopedCollection,
        limit: usize,
        consistency: ConsistencyLevel,
    ) -> WeaviateResult<usize> {
        let objects = self.data.fetch(target, consistency, limit).await?;
        if objects.is_empty() {
            warn!(%target, "No objects to delete");
            return Ok(0);
        }

        for object in &objects {
            self.data.delete_by_id(target, consistency, object.id).await?;
        }

        info!(%target, deleted = objects.len(), "Deleted objects");
        Ok(objects.len())
    }
}
