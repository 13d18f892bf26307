use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::client::DataClient;
use crate::error::{WeaviateError, WeaviateResult};
use crate::fanout::{OperationKind, TenantOperation};
use crate::generator::{convert_record, random_movie, random_vector};
use crate::models::{ConsistencyLevel, DataObject, Property, ScopedCollection};

/// Objects sent per batch request
pub const BATCH_SIZE: usize = 100;

/// Where ingested objects come from
#[derive(Debug, Clone)]
pub enum IngestSource {
    /// Random movies with random vectors of the given length
    Random { dimensions: usize },
    /// Records loaded from a JSON file, shaped to `schema` on insert
    Records {
        records: Vec<Map<String, Value>>,
        schema: Vec<Property>,
    },
}

pub struct IngestOperation {
    data: Arc<dyn DataClient>,
    source: IngestSource,
}

impl IngestOperation {
    pub fn new(data: Arc<dyn DataClient>, source: IngestSource) -> Self {
        Self { data, source }
    }

    fn build_objects(&self, limit: usize) -> WeaviateResult<Vec<DataObject>> {
        match &self.source {
            IngestSource::Random { dimensions } => {
                let mut rng = rand::rng();
                Ok((0..limit)
                    .map(|_| {
                        DataObject::new(random_movie(&mut rng, ""))
                            .with_vector(random_vector(&mut rng, *dimensions))
                    })
                    .collect())
            }
            IngestSource::Records { records, schema } => records
                .iter()
                .take(limit)
                .map(|record| convert_record(record, schema).map(DataObject::new))
                .collect(),
        }
    }
}

#[async_trait]
impl TenantOperation for IngestOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::Ingest
    }

    async fn apply(
        &mut self,
        target: &ScopedCollection,
        limit: usize,
        consistency: ConsistencyLevel,
    ) -> WeaviateResult<usize> {
        let objects = self.build_objects(limit)?;
        let total = objects.len();
        if total == 0 {
            warn!(%target, "Nothing to insert");
            return Ok(0);
        }

        let mut inserted = 0;
        let mut failures = Vec::new();
        let mut pending = objects.into_iter().peekable();
        while pending.peek().is_some() {
            let chunk: Vec<DataObject> = pending.by_ref().take(BATCH_SIZE).collect();
            let outcome = self.data.batch_insert(target, consistency, chunk).await?;
            inserted += outcome.inserted;
            failures.extend(outcome.failures);
        }

        for failure in &failures {
            error!(
                id = ?failure.id,
                message = %failure.message,
                "Failed to add object"
            );
        }
        if let Some(first) = failures.first() {
            return Err(WeaviateError::BatchFailed {
                failed: failures.len(),
                total,
                first_error: first.message.clone(),
            });
        }

        info!(%target, inserted, "Inserted objects");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockDataClient;
    use crate::models::{BatchFailure, BatchOutcome, movie_properties};
    use serde_json::json;

    #[tokio::test]
    async fn test_random_ingest_batches_and_sizes_vectors() {
        let mut data = MockDataClient::new();
        data.expect_batch_insert()
            .times(3)
            .returning(|target, consistency, objects| {
                assert_eq!(target.tenant(), Some("T0"));
                assert_eq!(consistency, ConsistencyLevel::All);
                assert!(objects.len() <= BATCH_SIZE);
                assert!(
                    objects
                        .iter()
                        .all(|o| o.vector.as_ref().map(Vec::len) == Some(768))
                );
                Ok(BatchOutcome {
                    inserted: objects.len(),
                    failures: vec![],
                })
            });

        let mut operation =
            IngestOperation::new(Arc::new(data), IngestSource::Random { dimensions: 768 });
        let target = ScopedCollection::new("Movies", crate::models::TenantScope::tenant("T0"));
        let inserted = operation
            .apply(&target, 250, ConsistencyLevel::All)
            .await
            .unwrap();
        assert_eq!(inserted, 250);
    }

    #[tokio::test]
    async fn test_record_ingest_converts_to_schema() {
        let mut data = MockDataClient::new();
        data.expect_batch_insert()
            .times(1)
            .returning(|_, _, objects| {
                assert_eq!(objects.len(), 1);
                assert_eq!(
                    objects[0].properties["releaseDate"],
                    json!("1995-10-30T00:00:00Z")
                );
                assert!(objects[0].vector.is_none());
                Ok(BatchOutcome {
                    inserted: 1,
                    failures: vec![],
                })
            });

        let records = vec![
            json!({"title": "Toy Story", "release_date": "1995-10-30"}),
            json!({"title": "Jumanji", "release_date": "1995-12-15"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let mut operation = IngestOperation::new(
            Arc::new(data),
            IngestSource::Records {
                records,
                schema: movie_properties(),
            },
        );

        let inserted = operation
            .apply(&ScopedCollection::unscoped("Movies"), 1, ConsistencyLevel::One)
            .await
            .unwrap();
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn test_object_failures_fail_the_tenant() {
        let mut data = MockDataClient::new();
        data.expect_batch_insert().returning(|_, _, objects| {
            Ok(BatchOutcome {
                inserted: objects.len() - 1,
                failures: vec![BatchFailure {
                    id: Some(objects[0].id),
                    message: "vector lengths don't match".to_string(),
                }],
            })
        });

        let mut operation =
            IngestOperation::new(Arc::new(data), IngestSource::Random { dimensions: 4 });
        let err = operation
            .apply(&ScopedCollection::unscoped("Movies"), 10, ConsistencyLevel::Quorum)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WeaviateError::BatchFailed { failed: 1, total: 10, .. }
        ));
    }

    #[tokio::test]
    async fn test_zero_limit_inserts_nothing() {
        let mut data = MockDataClient::new();
        data.expect_batch_insert().never();
        let mut operation =
            IngestOperation::new(Arc::new(data), IngestSource::Random { dimensions: 4 });
        let inserted = operation
            .apply(&ScopedCollection::unscoped("Movies"), 0, ConsistencyLevel::Quorum)
            .await
            .unwrap();
        assert_eq!(inserted, 0);
    }
}
