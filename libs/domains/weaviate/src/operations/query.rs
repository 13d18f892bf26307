use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::client::DataClient;
use crate::error::WeaviateResult;
use crate::fanout::{OperationKind, TenantOperation};
use crate::models::{ConsistencyLevel, QueryObject, ScopedCollection, SearchType, TenantScope};

/// Objects returned for one tenant
#[derive(Debug, Clone, PartialEq)]
pub struct TenantQueryResult {
    pub scope: TenantScope,
    pub objects: Vec<QueryObject>,
    pub latency: Duration,
}

pub struct QueryOperation {
    data: Arc<dyn DataClient>,
    search: SearchType,
    query: String,
    results: Vec<TenantQueryResult>,
}

impl QueryOperation {
    pub fn new(data: Arc<dyn DataClient>, search: SearchType, query: impl Into<String>) -> Self {
        Self {
            data,
            search,
            query: query.into(),
            results: Vec::new(),
        }
    }

    pub fn into_results(self) -> Vec<TenantQueryResult> {
        self.results
    }
}

#[async_trait]
impl TenantOperation for QueryOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::Query
    }

    async fn apply(
        &mut self,
        target: &ScopedCollection,
        limit: usize,
        consistency: ConsistencyLevel,
    ) -> WeaviateResult<usize> {
        let started = Instant::now();
        let objects = match self.search {
            SearchType::Fetch => self.data.fetch(target, consistency, limit).await?,
            SearchType::Vector => {
                self.data
                    .search_vector(target, consistency, &self.query, limit)
                    .await?
            }
            SearchType::Keyword => {
                self.data
                    .search_keyword(target, consistency, &self.query, limit)
                    .await?
            }
            SearchType::Hybrid => {
                self.data
                    .search_hybrid(target, consistency, &self.query, limit)
                    .await?
            }
        };
        let latency = started.elapsed();

        let count = objects.len();
        if count == 0 {
            warn!(%target, search = %self.search, "Query returned no objects");
        } else {
            info!(%target, search = %self.search, count, latency_ms = latency.as_millis() as u64, "Query done");
        }

        self.results.push(TenantQueryResult {
            scope: target.scope.clone(),
            objects,
            latency,
        });
        Ok(count)
    }
}
