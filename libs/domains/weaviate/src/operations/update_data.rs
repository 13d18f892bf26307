use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::client::DataClient;
use crate::error::{WeaviateError, WeaviateResult};
use crate::fanout::{OperationKind, TenantOperation};
use crate::generator::{mutate_properties, random_movie, random_vector};
use crate::models::{ConsistencyLevel, DataObject, Property, ScopedCollection};

/// How fetched objects are rewritten
#[derive(Debug, Clone)]
pub enum UpdateMode {
    /// Replace with a fresh random movie and vector of `dimensions`
    Randomize { dimensions: usize },
    /// Merge-update every property in place
    Mutate { schema: Vec<Property> },
}

pub struct UpdateDataOperation {
    data: Arc<dyn DataClient>,
    mode: UpdateMode,
}

impl UpdateDataOperation {
    pub fn new(data: Arc<dyn DataClient>, mode: UpdateMode) -> Self {
        Self { data, mode }
    }
}

#[async_trait]
impl TenantOperation for UpdateDataOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::UpdateData
    }

    async fn apply(
        &mut self,
        target: &ScopedCollection,
        limit: usize,
        consistency: ConsistencyLevel,
    ) -> WeaviateResult<usize> {
        let objects = self.data.fetch(target, consistency, limit).await?;
        if objects.is_empty() {
            return Err(WeaviateError::NoObjects(target.to_string()));
        }

        for object in &objects {
            match &self.mode {
                UpdateMode::Randomize { dimensions } => {
                    let replacement = {
                        let mut rng = rand::rng();
                        DataObject::new(random_movie(&mut rng, "-update"))
                            .with_id(object.id)
                            .with_vector(random_vector(&mut rng, *dimensions))
                    };
                    self.data.replace(target, consistency, replacement).await?;
                }
                UpdateMode::Mutate { schema } => {
                    let properties = mutate_properties(&object.properties, schema);
                    self.data
                        .update(target, consistency, object.id, properties)
                        .await?;
                }
            }
        }

        let found = objects.len();
        if found != limit {
            return Err(WeaviateError::ObjectCountMismatch {
                expected: limit,
                found,
            });
        }

        info!(%target, updated = found, "Updated objects");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockDataClient;
    use crate::models::{QueryObject, movie_properties};
    use serde_json::json;
    use uuid::Uuid;

    fn stored(title: &str) -> QueryObject {
        let properties = json!({"title": title, "popularity": 1.0})
            .as_object()
            .cloned()
            .unwrap_or_default();
        QueryObject::new(Uuid::new_v4(), properties)
    }

    #[tokio::test]
    async fn test_empty_tenant_is_a_failure() {
        let mut data = MockDataClient::new();
        data.expect_fetch().returning(|_, _, _| Ok(vec![]));
        data.expect_update().never();

        let mut operation = UpdateDataOperation::new(
            Arc::new(data),
            UpdateMode::Mutate {
                schema: movie_properties(),
            },
        );
        let err = operation
            .apply(&ScopedCollection::unscoped("Movies"), 10, ConsistencyLevel::One)
            .await
            .unwrap_err();
        assert!(matches!(err, WeaviateError::NoObjects(_)));
    }

    #[tokio::test]
    async fn test_mutate_updates_each_object() {
        let mut data = MockDataClient::new();
        data.expect_fetch()
            .returning(|_, _, _| Ok(vec![stored("Heat"), stored("Alien")]));
        data.expect_update()
            .times(2)
            .returning(|_, consistency, _, properties| {
                assert_eq!(consistency, ConsistencyLevel::Quorum);
                let title = properties["title"].as_str().unwrap_or_default();
                assert!(title.starts_with("updated-"));
                assert_eq!(properties["popularity"], json!(2.0));
                Ok(())
            });

        let mut operation = UpdateDataOperation::new(
            Arc::new(data),
            UpdateMode::Mutate {
                schema: movie_properties(),
            },
        );
        let updated = operation
            .apply(&ScopedCollection::unscoped("Movies"), 2, ConsistencyLevel::Quorum)
            .await
            .unwrap();
        assert_eq!(updated, 2);
    }

    #[tokio::test]
    async fn test_randomize_replaces_with_same_id() {
        let existing = stored("Heat");
        let id = existing.id;
        let mut data = MockDataClient::new();
        data.expect_fetch()
            .returning(move |_, _, _| Ok(vec![existing.clone()]));
        data.expect_replace()
            .times(1)
            .returning(move |_, _, object| {
                assert_eq!(object.id, id);
                assert_eq!(object.vector.as_ref().map(Vec::len), Some(1536));
                assert!(object.properties["title"]
                    .as_str()
                    .is_some_and(|t| t.starts_with("title-update")));
                Ok(())
            });

        let mut operation =
            UpdateDataOperation::new(Arc::new(data), UpdateMode::Randomize { dimensions: 1536 });
        operation
            .apply(&ScopedCollection::unscoped("Movies"), 1, ConsistencyLevel::All)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fewer_objects_than_requested() {
        let mut data = MockDataClient::new();
        data.expect_fetch().returning(|_, _, _| Ok(vec![stored("Heat")]));
        data.expect_update().times(1).returning(|_, _, _, _| Ok(()));

        let mut operation = UpdateDataOperation::new(
            Arc::new(data),
            UpdateMode::Mutate {
                schema: movie_properties(),
            },
        );
        let err = operation
            .apply(&ScopedCollection::unscoped("Movies"), 5, ConsistencyLevel::One)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WeaviateError::ObjectCountMismatch {
                expected: 5,
                found: 1
            }
        ));
    }
}
