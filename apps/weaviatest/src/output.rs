//! Plain-text rendering of command results for stdout.

use std::fmt::Write;

use domain_weaviate::{
    BackupDescriptor, CollectionSummary, FanOutReport, QueryObject, Tenant, TenantCounts,
    TenantQueryResult,
};
use serde_json::Value;

/// Properties shown per object in query output
const SHOWN_PROPERTIES: usize = 3;
const CELL_WIDTH: usize = 24;

fn cell(value: &str) -> String {
    if value.chars().count() > CELL_WIDTH {
        let cut: String = value.chars().take(CELL_WIDTH - 3).collect();
        format!("{cut}...")
    } else {
        value.to_string()
    }
}

fn property_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn metric(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string())
}

fn object_row(object: &QueryObject) -> String {
    let mut row = format!("{:<36}", object.id);
    for (name, value) in object.properties.iter().take(SHOWN_PROPERTIES) {
        let _ = write!(row, " | {name}: {}", cell(&property_text(value)));
    }
    let _ = write!(
        row,
        " | distance: {} | certainty: {} | score: {}",
        metric(object.distance),
        metric(object.certainty),
        metric(object.score)
    );
    row
}

pub fn query_results(results: &[TenantQueryResult]) -> String {
    let mut out = String::new();
    for result in results {
        let _ = writeln!(out, "Tenant: {}", result.scope);
        for object in &result.objects {
            let _ = writeln!(out, "  {}", object_row(object));
        }
        let _ = writeln!(
            out,
            "Total: {} objects ({:.3}s)",
            result.objects.len(),
            result.latency.as_secs_f64()
        );
    }
    out
}

/// Per-tenant counts of a data command, e.g. `inserted`.
pub fn fan_out_report(verb: &str, report: &FanOutReport) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        let _ = writeln!(out, "{:<30} {verb} {}", outcome.scope.to_string(), outcome.count);
    }
    let _ = writeln!(
        out,
        "Total: {verb} {} objects in {} across {} tenants",
        report.total(),
        report.collection,
        report.outcomes.len()
    );
    out
}

pub fn collection_summaries(summaries: &[CollectionSummary]) -> String {
    let mut out = format!(
        "{:<30} {:<12} {:>8} {:>10} {:>11} {:<14} {}\n",
        "Collection", "Multitenant", "Tenants", "Objects", "Replication", "Vector index", "Vectorizer"
    );
    for summary in summaries {
        let tenants = summary
            .tenants
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<30} {:<12} {:>8} {:>10} {:>11} {:<14} {}",
            summary.name,
            summary.multi_tenancy,
            tenants,
            summary.objects,
            summary.replication_factor,
            summary.vector_index,
            summary.vectorizer
        );
    }
    let _ = writeln!(out, "Total: {} collections", summaries.len());
    out
}

pub fn tenants(tenants: &[Tenant], verbose: bool) -> String {
    if verbose {
        let mut out = format!("{:<40} {}\n", "Tenant", "Status");
        for tenant in tenants {
            let _ = writeln!(out, "{:<40} {}", tenant.name, tenant.activity_status);
        }
        return out;
    }

    let counts = TenantCounts::from_tenants(tenants);
    format!(
        "Total: {}\nActive (HOT): {}\nInactive (COLD): {}\nOffloaded (FROZEN): {}\n",
        counts.total, counts.active, counts.inactive, counts.offloaded
    )
}

pub fn backup(descriptor: &BackupDescriptor) -> String {
    let mut out = format!("Backup ID: {}\n", descriptor.id);
    if let Some(path) = &descriptor.path {
        let _ = writeln!(out, "Path: {path}");
    }
    let _ = writeln!(out, "Status: {}", descriptor.status);
    if !descriptor.collections.is_empty() {
        let _ = writeln!(out, "Collections: {}", descriptor.collections.join(", "));
    }
    if let Some(error) = &descriptor.error {
        let _ = writeln!(out, "Error: {error}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_weaviate::{BackupStatus, TenantActivityStatus, TenantOutcome, TenantScope};
    use serde_json::json;
    use std::time::Duration;
    use uuid::Uuid;

    fn object(properties: Value) -> QueryObject {
        QueryObject::new(Uuid::nil(), properties.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_query_results_show_three_properties() {
        let mut hit = object(json!({
            "a_title": "Alien",
            "b_genre": "Horror",
            "c_year": 1979,
            "d_hidden": "not shown"
        }));
        hit.score = Some(0.5);
        let results = vec![TenantQueryResult {
            scope: TenantScope::tenant("T0"),
            objects: vec![hit],
            latency: Duration::from_millis(1500),
        }];

        let out = query_results(&results);
        assert!(out.starts_with("Tenant: T0\n"));
        assert!(out.contains("a_title: Alien | b_genre: Horror | c_year: 1979"));
        assert!(!out.contains("d_hidden"));
        assert!(out.contains("distance: - | certainty: - | score: 0.5000"));
        assert!(out.contains("Total: 1 objects (1.500s)"));
    }

    #[test]
    fn test_long_values_are_truncated() {
        let long = "x".repeat(40);
        let out = object_row(&object(json!({ "title": long })));
        assert!(out.contains(&format!("title: {}...", "x".repeat(CELL_WIDTH - 3))));
    }

    #[test]
    fn test_fan_out_report() {
        let report = FanOutReport {
            collection: "Movies".to_string(),
            outcomes: vec![
                TenantOutcome {
                    scope: TenantScope::tenant("T0"),
                    count: 3,
                },
                TenantOutcome {
                    scope: TenantScope::tenant("T1"),
                    count: 2,
                },
            ],
        };
        let out = fan_out_report("inserted", &report);
        assert!(out.contains("Total: inserted 5 objects in Movies across 2 tenants"));
    }

    #[test]
    fn test_collection_summaries() {
        let out = collection_summaries(&[CollectionSummary {
            name: "Movies".to_string(),
            multi_tenancy: false,
            tenants: None,
            objects: 42,
            replication_factor: 3,
            vector_index: "hnsw_pq".to_string(),
            vectorizer: "none".to_string(),
        }]);
        let row = out.lines().nth(1).unwrap_or_default();
        assert!(row.starts_with("Movies"));
        assert!(row.contains("hnsw_pq"));
        assert!(row.contains(" - "));
        assert!(out.ends_with("Total: 1 collections\n"));
    }

    #[test]
    fn test_tenant_counts_and_listing() {
        let list = vec![
            Tenant::new("T0", TenantActivityStatus::Hot),
            Tenant::new("T1", TenantActivityStatus::Cold),
            Tenant::new("T2", TenantActivityStatus::Active),
        ];
        assert_eq!(
            tenants(&list, false),
            "Total: 3\nActive (HOT): 2\nInactive (COLD): 1\nOffloaded (FROZEN): 0\n"
        );

        let verbose = tenants(&list, true);
        assert_eq!(verbose.lines().count(), 4);
        assert!(verbose.contains("T1"));
        assert!(verbose.contains("COLD"));
    }

    #[test]
    fn test_backup() {
        let out = backup(&BackupDescriptor {
            id: "nightly".to_string(),
            backend: Some("s3".to_string()),
            path: Some("s3://bucket/nightly".to_string()),
            status: BackupStatus::Success,
            collections: vec!["Movies".to_string(), "Books".to_string()],
            error: None,
        });
        assert_eq!(
            out,
            "Backup ID: nightly\nPath: s3://bucket/nightly\nStatus: SUCCESS\nCollections: Movies, Books\n"
        );
    }
}
