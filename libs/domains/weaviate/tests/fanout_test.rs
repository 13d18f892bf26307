//! Integration tests for the data commands
//!
//! Every data command runs through the tenant fan-out against the in-memory
//! server, covering:
//! - tenant resolution (unscoped, auto tenants, inactive tenants)
//! - continue-and-aggregate failure reporting
//! - ingest, query, update and delete per tenant

use std::path::PathBuf;
use std::sync::Arc;

use domain_weaviate::models::movie_properties;
use domain_weaviate::*;
use serde_json::json;

// ============================================================================
// Helpers
// ============================================================================

async fn store_with_movies(multi_tenancy: MultiTenancyConfig) -> InMemoryWeaviate {
    let store = InMemoryWeaviate::new();
    CollectionClient::create(
        &store,
        CreateCollection::new("Movies")
            .with_properties(movie_properties())
            .with_multi_tenancy(multi_tenancy),
    )
    .await
    .unwrap();
    store
}

fn multi_tenant(auto_tenant_creation: bool) -> MultiTenancyConfig {
    MultiTenancyConfig {
        enabled: true,
        auto_tenant_creation,
        auto_tenant_activation: false,
    }
}

async fn add_tenants(store: &InMemoryWeaviate, tenants: &[(&str, TenantActivityStatus)]) {
    TenantClient::create(
        store,
        "Movies",
        tenants
            .iter()
            .map(|(name, status)| Tenant::new(*name, *status))
            .collect(),
    )
    .await
    .unwrap();
}

fn data_service(store: &InMemoryWeaviate) -> DataService {
    let shared = Arc::new(store.clone());
    DataService::new(shared.clone(), shared.clone(), shared)
}

fn request(limit: usize) -> FanOutRequest {
    FanOutRequest::new("Movies", limit, ConsistencyLevel::Quorum)
}

fn random_ingest(request: FanOutRequest) -> IngestOptions {
    IngestOptions {
        request,
        randomize: true,
        data_file: PathBuf::from("unused.json"),
    }
}

fn tenant(name: &str) -> ScopedCollection {
    ScopedCollection::new("Movies", TenantScope::tenant(name))
}

fn scopes(report: &FanOutReport) -> Vec<String> {
    report.outcomes.iter().map(|o| o.scope.to_string()).collect()
}

// ============================================================================
// Ingest
// ============================================================================

#[tokio::test]
async fn test_ingest_single_tenant_collection() {
    let store = store_with_movies(MultiTenancyConfig::default()).await;

    let report = data_service(&store)
        .ingest(random_ingest(request(10).with_auto_tenants(3)))
        .await
        .unwrap();

    assert_eq!(
        report.outcomes,
        vec![TenantOutcome {
            scope: TenantScope::Unscoped,
            count: 10
        }]
    );
    let objects = store.objects(&ScopedCollection::unscoped("Movies")).await;
    assert_eq!(objects.len(), 10);
    assert!(objects.iter().all(|o| o.vector.as_ref().map(Vec::len) == Some(1536)));
}

#[tokio::test]
async fn test_ingest_appends_auto_tenants() {
    let store = store_with_movies(multi_tenant(true)).await;
    add_tenants(
        &store,
        &[
            ("T0", TenantActivityStatus::Active),
            ("T1", TenantActivityStatus::Active),
        ],
    )
    .await;

    let report = data_service(&store)
        .ingest(random_ingest(request(2).with_auto_tenants(4)))
        .await
        .unwrap();

    assert_eq!(scopes(&report), vec!["T0", "T1", "Tenant--3", "Tenant--4"]);
    assert_eq!(report.total(), 8);

    let tenants = TenantClient::get(&store, "Movies").await.unwrap();
    assert_eq!(tenants.len(), 4);
    assert_eq!(store.objects(&tenant("Tenant--4")).await.len(), 2);
}

#[tokio::test]
async fn test_auto_tenants_need_auto_creation() {
    let store = store_with_movies(multi_tenant(false)).await;

    let err = data_service(&store)
        .ingest(random_ingest(request(2).with_auto_tenants(2)))
        .await
        .unwrap_err();

    assert!(matches!(err, WeaviateError::AutoTenantNotEnabled(name) if name == "Movies"));
}

#[tokio::test]
async fn test_failing_tenant_does_not_stop_the_others() {
    let store = store_with_movies(multi_tenant(false)).await;
    add_tenants(
        &store,
        &[
            ("T0", TenantActivityStatus::Active),
            ("T1", TenantActivityStatus::Cold),
            ("T2", TenantActivityStatus::Active),
        ],
    )
    .await;

    let err = data_service(&store)
        .ingest(random_ingest(request(3)))
        .await
        .unwrap_err();

    match err {
        WeaviateError::TenantOperationFailed { tenant, cause } => {
            assert_eq!(tenant, "T1");
            assert!(matches!(*cause, WeaviateError::BatchFailed { failed: 3, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.objects(&tenant("T0")).await.len(), 3);
    assert_eq!(store.objects(&tenant("T2")).await.len(), 3);
}

#[tokio::test]
async fn test_ingest_from_data_file() {
    let store = store_with_movies(MultiTenancyConfig::default()).await;
    let path = std::env::temp_dir().join(format!("movies-{}.json", uuid::Uuid::new_v4()));
    let records = json!([
        { "title": "Alien", "popularity": "12.5", "release_date": "1979-05-25", "id": 348 },
        { "title": "Heat", "popularity": 30, "release_date": "1995-12-15" }
    ]);
    std::fs::write(&path, records.to_string()).unwrap();

    let report = data_service(&store)
        .ingest(IngestOptions {
            request: request(10),
            randomize: false,
            data_file: path.clone(),
        })
        .await;
    std::fs::remove_file(&path).unwrap();

    assert_eq!(report.unwrap().total(), 2);
    let objects = store.objects(&ScopedCollection::unscoped("Movies")).await;
    let alien = &objects[0].properties;
    assert_eq!(alien["title"], "Alien");
    assert_eq!(alien["popularity"], 12.5);
    assert_eq!(alien["releaseDate"], "1979-05-25T00:00:00Z");
    assert!(!alien.contains_key("id"));
    assert!(objects[0].vector.is_none());
}

#[tokio::test]
async fn test_ingest_missing_collection() {
    let store = InMemoryWeaviate::new();
    let err = data_service(&store)
        .ingest(random_ingest(request(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, WeaviateError::CollectionNotFound(_)));
}

// ============================================================================
// Query
// ============================================================================

#[tokio::test]
async fn test_query_skips_inactive_tenants() {
    let store = store_with_movies(multi_tenant(false)).await;
    add_tenants(
        &store,
        &[
            ("T0", TenantActivityStatus::Active),
            ("T1", TenantActivityStatus::Active),
            ("T2", TenantActivityStatus::Hot),
        ],
    )
    .await;
    let service = data_service(&store);
    service.ingest(random_ingest(request(4))).await.unwrap();
    TenantClient::update(
        &store,
        "Movies",
        vec![Tenant::new("T1", TenantActivityStatus::Inactive)],
    )
    .await
    .unwrap();

    let results = service
        .query(QueryOptions {
            request: request(3),
            search: SearchType::Fetch,
            query: String::new(),
        })
        .await
        .unwrap();

    let visited: Vec<String> = results.iter().map(|r| r.scope.to_string()).collect();
    assert_eq!(visited, vec!["T0", "T2"]);
    assert!(results.iter().all(|r| r.objects.len() == 3));
}

#[tokio::test]
async fn test_keyword_query() {
    let store = store_with_movies(MultiTenancyConfig::default()).await;
    let target = ScopedCollection::unscoped("Movies");
    let movie = |title: &str| {
        DataObject::new(json!({ "title": title }).as_object().cloned().unwrap_or_default())
    };
    store
        .batch_insert(
            &target,
            ConsistencyLevel::One,
            vec![movie("The Matrix"), movie("Heat"), movie("Matrix Reloaded")],
        )
        .await
        .unwrap();

    let results = data_service(&store)
        .query(QueryOptions {
            request: request(10),
            search: SearchType::Keyword,
            query: "matrix".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].objects.len(), 2);
    assert!(results[0].objects.iter().all(|o| o.score.is_some()));
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_mutates_every_object() {
    let store = store_with_movies(MultiTenancyConfig::default()).await;
    let service = data_service(&store);
    service.ingest(random_ingest(request(4))).await.unwrap();

    let report = service
        .update(UpdateDataOptions {
            request: request(4),
            randomize: false,
        })
        .await
        .unwrap();

    assert_eq!(report.total(), 4);
    let objects = store.objects(&ScopedCollection::unscoped("Movies")).await;
    for object in objects {
        let title = object.properties["title"].as_str().unwrap_or_default();
        assert!(title.starts_with("updated-title"), "{title}");
    }
}

#[tokio::test]
async fn test_randomized_update_keeps_ids() {
    let store = store_with_movies(MultiTenancyConfig::default()).await;
    let service = data_service(&store);
    service.ingest(random_ingest(request(3))).await.unwrap();
    let target = ScopedCollection::unscoped("Movies");
    let before: Vec<uuid::Uuid> = store.objects(&target).await.iter().map(|o| o.id).collect();

    service
        .update(UpdateDataOptions {
            request: request(3),
            randomize: true,
        })
        .await
        .unwrap();

    let after = store.objects(&target).await;
    assert_eq!(after.iter().map(|o| o.id).collect::<Vec<_>>(), before);
    for object in after {
        let title = object.properties["title"].as_str().unwrap_or_default();
        assert!(title.starts_with("title-update"), "{title}");
    }
}

#[tokio::test]
async fn test_update_reports_short_tenant() {
    let store = store_with_movies(MultiTenancyConfig::default()).await;
    let service = data_service(&store);
    service.ingest(random_ingest(request(4))).await.unwrap();

    let err = service
        .update(UpdateDataOptions {
            request: request(6),
            randomize: false,
        })
        .await
        .unwrap_err();

    match err {
        WeaviateError::TenantOperationFailed { tenant, cause } => {
            assert_eq!(tenant, "<none>");
            assert!(matches!(
                *cause,
                WeaviateError::ObjectCountMismatch {
                    expected: 6,
                    found: 4
                }
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_update_empty_collection() {
    let store = store_with_movies(MultiTenancyConfig::default()).await;
    let err = data_service(&store)
        .update(UpdateDataOptions {
            request: request(5),
            randomize: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WeaviateError::TenantOperationFailed { cause, .. } if matches!(*cause, WeaviateError::NoObjects(_))
    ));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_until_empty() {
    let store = store_with_movies(multi_tenant(true)).await;
    let service = data_service(&store);
    service
        .ingest(random_ingest(request(5).with_auto_tenants(2)))
        .await
        .unwrap();

    let first = service.delete(request(3)).await.unwrap();
    assert_eq!(first.total(), 6);

    let second = service.delete(request(10)).await.unwrap();
    assert_eq!(second.total(), 4);

    let third = service.delete(request(10)).await.unwrap();
    assert_eq!(third.total(), 0);
    assert_eq!(scopes(&third), vec!["Tenant--1", "Tenant--2"]);
}
