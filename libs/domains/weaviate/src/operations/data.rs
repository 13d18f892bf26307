use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::client::{CollectionClient, DataClient, TenantClient};
use crate::error::WeaviateResult;
use crate::fanout::{FanOutReport, FanOutRequest, OperationKind, TenantFanOut};
use crate::generator::load_records;
use crate::models::SearchType;

use super::delete_data::DeleteDataOperation;
use super::ingest::{IngestOperation, IngestSource};
use super::query::{QueryOperation, TenantQueryResult};
use super::update_data::{UpdateDataOperation, UpdateMode};

/// Default movie data file for non-random ingest
pub const DEFAULT_DATA_FILE: &str = "movies.json";

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub request: FanOutRequest,
    pub randomize: bool,
    pub data_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub request: FanOutRequest,
    pub search: SearchType,
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct UpdateDataOptions {
    pub request: FanOutRequest,
    pub randomize: bool,
}

/// Object-level commands, each fanned out over the collection's tenants
pub struct DataService {
    fan_out: TenantFanOut,
    collections: Arc<dyn CollectionClient>,
    data: Arc<dyn DataClient>,
}

impl DataService {
    pub fn new(
        collections: Arc<dyn CollectionClient>,
        tenants: Arc<dyn TenantClient>,
        data: Arc<dyn DataClient>,
    ) -> Self {
        Self {
            fan_out: TenantFanOut::new(collections.clone(), tenants),
            collections,
            data,
        }
    }

    pub async fn ingest(&self, options: IngestOptions) -> WeaviateResult<FanOutReport> {
        let plan = self
            .fan_out
            .resolve(&options.request, OperationKind::Ingest)
            .await?;
        let config = self.collections.get(&plan.collection).await?;

        let source = if options.randomize {
            IngestSource::Random {
                dimensions: config.vector_dimensions(),
            }
        } else {
            let records = load_records(&options.data_file, options.request.limit)?;
            info!(
                file = %options.data_file.display(),
                records = records.len(),
                "Loaded data file"
            );
            IngestSource::Records {
                records,
                schema: config.properties,
            }
        };

        let mut operation = IngestOperation::new(self.data.clone(), source);
        let report = self.fan_out.execute(&plan, &mut operation).await?;
        info!(collection = %report.collection, inserted = report.total(), "Ingest finished");
        Ok(report)
    }

    pub async fn query(&self, options: QueryOptions) -> WeaviateResult<Vec<TenantQueryResult>> {
        let mut operation = QueryOperation::new(self.data.clone(), options.search, options.query);
        self.fan_out.run(&options.request, &mut operation).await?;
        Ok(operation.into_results())
    }

    pub async fn update(&self, options: UpdateDataOptions) -> WeaviateResult<FanOutReport> {
        let plan = self
            .fan_out
            .resolve(&options.request, OperationKind::UpdateData)
            .await?;
        let config = self.collections.get(&plan.collection).await?;

        let mode = if options.randomize {
            UpdateMode::Randomize {
                dimensions: config.vector_dimensions(),
            }
        } else {
            UpdateMode::Mutate {
                schema: config.properties,
            }
        };

        let mut operation = UpdateDataOperation::new(self.data.clone(), mode);
        let report = self.fan_out.execute(&plan, &mut operation).await?;
        info!(collection = %report.collection, updated = report.total(), "Update finished");
        Ok(report)
    }

    pub async fn delete(&self, request: FanOutRequest) -> WeaviateResult<FanOutReport> {
        let mut operation = DeleteDataOperation::new(self.data.clone());
        let report = self.fan_out.run(&request, &mut operation).await?;
        info!(collection = %report.collection, deleted = report.total(), "Delete finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockCollectionClient, MockDataClient, MockTenantClient};
    use crate::error::WeaviateError;
    use crate::fanout::tests::collection_config;
    use crate::models::{
        BatchOutcome, ConsistencyLevel, MultiTenancyConfig, QueryObject, Tenant,
        TenantActivityStatus,
    };
    use serde_json::Map;
    use uuid::Uuid;

    fn collections(vectorizer: &'static str) -> MockCollectionClient {
        let mut collections = MockCollectionClient::new();
        collections.expect_exists().returning(|_| Ok(true));
        collections.expect_get().returning(move |name| {
            let mut config = collection_config(name, MultiTenancyConfig::default());
            config.vectorizer = vectorizer.to_string();
            Ok(config)
        });
        collections
    }

    fn tenants(tenants: Vec<Tenant>) -> MockTenantClient {
        let mut client = MockTenantClient::new();
        client.expect_get().returning(move |_| Ok(tenants.clone()));
        client
    }

    #[tokio::test]
    async fn test_random_ingest_uses_vectorizer_dimensions() {
        let mut data = MockDataClient::new();
        data.expect_batch_insert()
            .times(2)
            .returning(|_, _, objects| {
                assert!(objects.iter().all(|o| o.vector.as_ref().map(Vec::len) == Some(300)));
                Ok(BatchOutcome {
                    inserted: objects.len(),
                    failures: vec![],
                })
            });

        let service = DataService::new(
            Arc::new(collections("text2vec-contextionary")),
            Arc::new(tenants(vec![
                Tenant::new("T0", TenantActivityStatus::Active),
                Tenant::new("T1", TenantActivityStatus::Cold),
            ])),
            Arc::new(data),
        );
        let report = service
            .ingest(IngestOptions {
                request: FanOutRequest::new("Movies", 20, ConsistencyLevel::Quorum),
                randomize: true,
                data_file: PathBuf::from(DEFAULT_DATA_FILE),
            })
            .await
            .unwrap();
        assert_eq!(report.total(), 40);
        assert_eq!(report.outcomes.len(), 2);
    }

    #[tokio::test]
    async fn test_randomized_update_uses_vectorizer_dimensions() {
        let mut data = MockDataClient::new();
        data.expect_fetch().returning(|_, _, _| {
            Ok(vec![QueryObject::new(Uuid::new_v4(), Map::new())])
        });
        data.expect_replace()
            .times(1)
            .returning(|_, _, object| {
                assert_eq!(object.vector.as_ref().map(Vec::len), Some(768));
                Ok(())
            });

        let service = DataService::new(
            Arc::new(collections("text2vec-transformers")),
            Arc::new(tenants(vec![])),
            Arc::new(data),
        );
        let report = service
            .update(UpdateDataOptions {
                request: FanOutRequest::new("Movies", 1, ConsistencyLevel::One),
                randomize: true,
            })
            .await
            .unwrap();
        assert_eq!(report.total(), 1);
    }

    #[tokio::test]
    async fn test_ingest_missing_data_file() {
        let mut data = MockDataClient::new();
        data.expect_batch_insert().never();
        let service = DataService::new(
            Arc::new(collections("none")),
            Arc::new(tenants(vec![])),
            Arc::new(data),
        );

        let err = service
            .ingest(IngestOptions {
                request: FanOutRequest::new("Movies", 20, ConsistencyLevel::Quorum),
                randomize: false,
                data_file: PathBuf::from("/nonexistent/movies.json"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WeaviateError::DataFile { .. }));
    }

    #[tokio::test]
    async fn test_query_skips_inactive_tenants() {
        let mut data = MockDataClient::new();
        data.expect_search_hybrid()
            .times(1)
            .returning(|target, _, _, _| {
                assert_eq!(target.tenant(), Some("hot"));
                Ok(vec![QueryObject::new(Uuid::new_v4(), Map::new())])
            });

        let service = DataService::new(
            Arc::new(collections("none")),
            Arc::new(tenants(vec![
                Tenant::new("cold", TenantActivityStatus::Inactive),
                Tenant::new("hot", TenantActivityStatus::Hot),
            ])),
            Arc::new(data),
        );
        let results = service
            .query(QueryOptions {
                request: FanOutRequest::new("Movies", 10, ConsistencyLevel::One),
                search: SearchType::Hybrid,
                query: "Action movie".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].objects.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_per_tenant_counts() {
        let mut data = MockDataClient::new();
        data.expect_fetch().returning(|target, _, _| {
            let count = if target.tenant() == Some("T0") { 2 } else { 0 };
            Ok((0..count)
                .map(|_| QueryObject::new(Uuid::new_v4(), Map::new()))
                .collect())
        });
        data.expect_delete_by_id().times(2).returning(|_, _, _| Ok(()));

        let service = DataService::new(
            Arc::new(collections("none")),
            Arc::new(tenants(vec![
                Tenant::new("T0", TenantActivityStatus::Active),
                Tenant::new("T1", TenantActivityStatus::Active),
            ])),
            Arc::new(data),
        );
        let report = service
            .delete(FanOutRequest::new("Movies", 100, ConsistencyLevel::Quorum))
            .await
            .unwrap();
        assert_eq!(report.total(), 2);
        assert_eq!(report.outcomes[1].count, 0);
    }
}
