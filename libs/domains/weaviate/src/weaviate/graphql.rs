//! GraphQL `Get` and `Aggregate` queries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::classify_error;
use crate::error::{WeaviateError, WeaviateResult};
use crate::models::{CollectionConfig, ConsistencyLevel, QueryObject, ScopedCollection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SearchMode<'a> {
    Fetch,
    NearText(&'a str),
    Bm25(&'a str),
    Hybrid(&'a str),
}

impl SearchMode<'_> {
    fn additional(&self) -> &'static str {
        match self {
            SearchMode::Fetch => "id",
            SearchMode::NearText(_) => "id distance certainty",
            SearchMode::Bm25(_) | SearchMode::Hybrid(_) => "id score",
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct GraphQlRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

fn quote(raw: &str) -> String {
    Value::String(raw.to_string()).to_string()
}

/// Properties a `Get` can select without a sub-selection.
pub(super) fn selectable_properties(config: &CollectionConfig) -> Vec<&str> {
    config
        .properties
        .iter()
        .filter(|p| p.data_type.is_primitive())
        .map(|p| p.name.as_str())
        .collect()
}

pub(super) fn get_query(
    target: &ScopedCollection,
    consistency: ConsistencyLevel,
    mode: SearchMode<'_>,
    properties: &[&str],
    limit: usize,
) -> String {
    let mut args = vec![format!("limit: {limit}")];
    if let Some(tenant) = target.tenant() {
        args.push(format!("tenant: {}", quote(tenant)));
    }
    args.push(format!("consistencyLevel: {}", consistency.as_wire()));
    match mode {
        SearchMode::Fetch => {}
        SearchMode::NearText(query) => {
            args.push(format!("nearText: {{concepts: [{}]}}", quote(query)))
        }
        SearchMode::Bm25(query) => args.push(format!("bm25: {{query: {}}}", quote(query))),
        SearchMode::Hybrid(query) => args.push(format!("hybrid: {{query: {}}}", quote(query))),
    }

    format!(
        "{{ Get {{ {}({}) {{ {} _additional {{ {} }} }} }} }}",
        target.collection,
        args.join(", "),
        properties.join(" "),
        mode.additional()
    )
}

pub(super) fn aggregate_query(target: &ScopedCollection) -> String {
    let args = target
        .tenant()
        .map(|tenant| format!("(tenant: {})", quote(tenant)))
        .unwrap_or_default();
    format!(
        "{{ Aggregate {{ {}{} {{ meta {{ count }} }} }} }}",
        target.collection, args
    )
}

impl GraphQlResponse {
    fn into_data(self, collection: &str) -> WeaviateResult<Value> {
        if !self.errors.is_empty() {
            let message = self
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(classify_error(None, message, collection));
        }
        self.data
            .ok_or_else(|| WeaviateError::backend("GraphQL response without data"))
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub(super) fn parse_get_response(
    response: GraphQlResponse,
    collection: &str,
) -> WeaviateResult<Vec<QueryObject>> {
    let mut data = response.into_data(collection)?;
    let result = data
        .pointer_mut(&format!("/Get/{collection}"))
        .map(Value::take)
        .unwrap_or_default();
    let objects = match result {
        Value::Array(objects) => objects,
        Value::Null => Vec::new(),
        other => {
            return Err(WeaviateError::Serialization(format!(
                "unexpected Get result: {other}"
            )));
        }
    };

    objects
        .into_iter()
        .map(|object| {
            let Value::Object(mut properties) = object else {
                return Err(WeaviateError::Serialization(
                    "Get result is not an object".to_string(),
                ));
            };
            let additional = properties.remove("_additional").unwrap_or_default();
            let id = additional["id"]
                .as_str()
                .and_then(|id| Uuid::parse_str(id).ok())
                .ok_or_else(|| WeaviateError::Serialization("object without id".to_string()))?;

            let mut object = QueryObject::new(id, strip_nulls(properties));
            object.distance = number(&additional["distance"]);
            object.certainty = number(&additional["certainty"]);
            object.score = number(&additional["score"]);
            Ok(object)
        })
        .collect()
}

fn strip_nulls(properties: Map<String, Value>) -> Map<String, Value> {
    properties.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

pub(super) fn parse_aggregate_response(
    response: GraphQlResponse,
    collection: &str,
) -> WeaviateResult<u64> {
    let data = response.into_data(collection)?;
    Ok(data["Aggregate"][collection][0]["meta"]["count"]
        .as_u64()
        .unwrap_or_default())
}
