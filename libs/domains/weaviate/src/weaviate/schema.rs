//! JSON shapes of the `/v1/schema` and `/v1/batch` endpoints and their
//! mapping onto the domain models.

use serde::Deserialize;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::error::{WeaviateError, WeaviateResult};
use crate::models::{
    BatchFailure, BatchOutcome, CollectionConfig, CreateCollection, DataObject, DataType,
    IndexAlgorithm, MultiTenancyConfig, OLLAMA_MODEL, Property, Quantizer, ReplicationConfig,
    ScopedCollection, UpdateCollection, VectorIndexConfig, Vectorizer,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ClassDto {
    class: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    properties: Vec<PropertyDto>,
    #[serde(default)]
    vector_index_type: Option<String>,
    #[serde(default)]
    vector_index_config: Value,
    #[serde(default)]
    vectorizer: Option<String>,
    #[serde(default)]
    replication_config: ReplicationDto,
    #[serde(default)]
    sharding_config: ShardingDto,
    #[serde(default)]
    multi_tenancy_config: MultiTenancyDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyDto {
    name: String,
    #[serde(default)]
    data_type: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ReplicationDto {
    factor: u32,
    async_enabled: bool,
}

impl Default for ReplicationDto {
    fn default() -> Self {
        Self {
            factor: 1,
            async_enabled: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ShardingDto {
    desired_count: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MultiTenancyDto {
    enabled: bool,
    auto_tenant_creation: bool,
    auto_tenant_activation: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct SchemaDto {
    #[serde(default)]
    pub classes: Vec<ClassDto>,
}

impl ClassDto {
    pub fn name(&self) -> &str {
        &self.class
    }

    pub fn into_config(self) -> CollectionConfig {
        let properties = self
            .properties
            .into_iter()
            .map(|p| Property {
                name: p.name,
                data_type: DataType::from(p.data_type.into_iter().next().unwrap_or_default()),
                description: p.description,
            })
            .collect();

        CollectionConfig {
            name: self.class,
            description: self.description,
            properties,
            vector_index: parse_vector_index(
                self.vector_index_type.as_deref(),
                &self.vector_index_config,
            ),
            vectorizer: self.vectorizer.unwrap_or_else(|| "none".to_string()),
            replication: ReplicationConfig {
                factor: self.replication_config.factor,
                async_enabled: self.replication_config.async_enabled,
            },
            shards: self.sharding_config.desired_count.max(1),
            multi_tenancy: MultiTenancyConfig {
                enabled: self.multi_tenancy_config.enabled,
                auto_tenant_creation: self.multi_tenancy_config.auto_tenant_creation,
                auto_tenant_activation: self.multi_tenancy_config.auto_tenant_activation,
            },
        }
    }
}

fn enabled(config: &Value, quantizer: &str) -> bool {
    config[quantizer]["enabled"].as_bool().unwrap_or(false)
}

fn parse_vector_index(index_type: Option<&str>, config: &Value) -> VectorIndexConfig {
    let algorithm = match index_type {
        Some("flat") => IndexAlgorithm::Flat,
        _ => IndexAlgorithm::Hnsw,
    };
    let training_limit = |q: &str| config[q]["trainingLimit"].as_u64().unwrap_or_default();

    let quantizer = if enabled(config, "pq") {
        Some(Quantizer::Pq {
            training_limit: training_limit("pq"),
        })
    } else if enabled(config, "bq") {
        Some(Quantizer::Bq {
            cache: config["bq"]["cache"].as_bool().unwrap_or(false),
        })
    } else if enabled(config, "sq") {
        Some(Quantizer::Sq {
            training_limit: training_limit("sq"),
        })
    } else {
        None
    };

    VectorIndexConfig {
        algorithm,
        quantizer,
    }
}

fn quantizer_body(quantizer: &Quantizer) -> (&'static str, Value) {
    let body = match quantizer {
        Quantizer::Pq { training_limit } | Quantizer::Sq { training_limit } => {
            json!({ "enabled": true, "trainingLimit": training_limit })
        }
        Quantizer::Bq { cache } => json!({ "enabled": true, "cache": cache }),
    };
    (quantizer.name(), body)
}

fn vector_index_body(config: &VectorIndexConfig) -> Value {
    let mut body = Map::new();
    if let Some(quantizer) = &config.quantizer {
        let (key, value) = quantizer_body(quantizer);
        body.insert(key.to_string(), value);
    }
    Value::Object(body)
}

/// `POST /v1/schema` body
pub(super) fn create_body(input: &CreateCollection) -> Value {
    let properties: Vec<Value> = input
        .properties
        .iter()
        .map(|p| {
            let mut property = json!({ "name": p.name, "dataType": [p.data_type.as_str()] });
            if let Some(description) = &p.description {
                property["description"] = json!(description);
            }
            property
        })
        .collect();

    let mut body = json!({
        "class": input.name,
        "properties": properties,
        "vectorIndexType": input.vector_index.algorithm.to_string(),
        "vectorIndexConfig": vector_index_body(&input.vector_index),
        "vectorizer": input.vectorizer.map_or("none", Vectorizer::module_name),
        "replicationConfig": {
            "factor": input.replication.factor,
            "asyncEnabled": input.replication.async_enabled,
        },
        "multiTenancyConfig": {
            "enabled": input.multi_tenancy.enabled,
            "autoTenantCreation": input.multi_tenancy.auto_tenant_creation,
            "autoTenantActivation": input.multi_tenancy.auto_tenant_activation,
        },
    });

    if let Some(description) = &input.description {
        body["description"] = json!(description);
    }
    if input.shards > 1 {
        body["shardingConfig"] = json!({ "desiredCount": input.shards });
    }
    if input.vectorizer == Some(Vectorizer::Ollama) {
        body["moduleConfig"] = json!({
            "text2vec-ollama": { "model": OLLAMA_MODEL }
        });
    }
    body
}

/// Apply a partial update to the class document read from the server, for a
/// read-modify-write `PUT /v1/schema/{c}`.
pub(super) fn apply_update(class: &mut Value, update: &UpdateCollection) -> WeaviateResult<()> {
    let Some(class) = class.as_object_mut() else {
        return Err(WeaviateError::Serialization(
            "class definition is not a JSON object".to_string(),
        ));
    };

    if let Some(description) = &update.description {
        class.insert("description".to_string(), json!(description));
    }
    if let Some(index) = &update.vector_index {
        class.insert(
            "vectorIndexType".to_string(),
            json!(index.algorithm.to_string()),
        );
        if let Some(quantizer) = &index.quantizer {
            let (key, value) = quantizer_body(quantizer);
            set_nested(class, "vectorIndexConfig", key, value);
        }
    }
    if let Some(async_enabled) = update.async_replication {
        set_nested(class, "replicationConfig", "asyncEnabled", json!(async_enabled));
    }
    if let Some(creation) = update.auto_tenant_creation {
        set_nested(class, "multiTenancyConfig", "autoTenantCreation", json!(creation));
    }
    if let Some(activation) = update.auto_tenant_activation {
        set_nested(class, "multiTenancyConfig", "autoTenantActivation", json!(activation));
    }
    Ok(())
}

/// Set `class[section][field]`, creating the section when it is missing.
fn set_nested(class: &mut Map<String, Value>, section: &str, field: &str, value: Value) {
    let mut nested = match class.remove(section) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    nested.insert(field.to_string(), value);
    class.insert(section.to_string(), Value::Object(nested));
}

/// One element of the `POST /v1/batch/objects` body
pub(super) fn batch_object(target: &ScopedCollection, object: &DataObject) -> Value {
    let mut body = json!({
        "class": target.collection,
        "id": object.id,
        "properties": object.properties,
    });
    if let Some(vector) = &object.vector {
        body["vector"] = json!(vector);
    }
    if let Some(tenant) = target.tenant() {
        body["tenant"] = json!(tenant);
    }
    body
}

#[derive(Debug, Deserialize)]
pub(super) struct BatchItemDto {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    result: Option<BatchResultDto>,
}

#[derive(Debug, Deserialize)]
struct BatchResultDto {
    #[serde(default)]
    errors: Option<ErrorListDto>,
}

/// `{"error": [{"message": "..."}]}` as returned by most endpoints
#[derive(Debug, Deserialize)]
pub(super) struct ErrorListDto {
    #[serde(default)]
    error: Vec<ErrorMessageDto>,
}

#[derive(Debug, Deserialize)]
struct ErrorMessageDto {
    message: String,
}

impl ErrorListDto {
    fn joined(&self) -> Option<String> {
        if self.error.is_empty() {
            return None;
        }
        Some(
            self.error
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

pub(super) fn parse_batch_response(items: Vec<BatchItemDto>) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for item in items {
        let message = item
            .result
            .and_then(|r| r.errors)
            .and_then(|errors| errors.joined());
        match message {
            Some(message) => outcome.failures.push(BatchFailure {
                id: item.id,
                message,
            }),
            None => outcome.inserted += 1,
        }
    }
    outcome
}

/// Readable message from an error response body.
pub(super) fn error_message(body: &str) -> String {
    if let Some(message) = serde_json::from_str::<ErrorListDto>(body)
        .ok()
        .and_then(|errors| errors.joined())
    {
        return message;
    }
    let body = body.trim();
    if body.is_empty() {
        "empty response body".to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TenantScope, VectorIndexType, movie_properties};

    fn class_json() -> Value {
        json!({
            "class": "Movies",
            "properties": [
                { "name": "title", "dataType": ["text"] },
                { "name": "popularity", "dataType": ["number"] },
                { "name": "director", "dataType": ["Person"] }
            ],
            "vectorIndexType": "flat",
            "vectorIndexConfig": {
                "distance": "cosine",
                "bq": { "enabled": true, "cache": true },
                "pq": { "enabled": false }
            },
            "vectorizer": "text2vec-transformers",
            "replicationConfig": { "factor": 3, "asyncEnabled": true },
            "shardingConfig": { "desiredCount": 0 },
            "multiTenancyConfig": { "enabled": true, "autoTenantCreation": true }
        })
    }

    #[test]
    fn test_class_maps_to_collection_config() {
        let dto: ClassDto = serde_json::from_value(class_json()).unwrap();
        let config = dto.into_config();

        assert_eq!(config.name, "Movies");
        assert_eq!(config.vector_index.label(), "flat_bq");
        assert_eq!(config.vector_index.quantizer, Some(Quantizer::Bq { cache: true }));
        assert_eq!(config.vector_dimensions(), 768);
        assert_eq!(config.replication.factor, 3);
        assert!(config.replication.async_enabled);
        assert_eq!(config.shards, 1);
        assert!(config.multi_tenancy.enabled);
        assert!(config.multi_tenancy.auto_tenant_creation);
        assert!(!config.multi_tenancy.auto_tenant_activation);
        assert_eq!(
            config.property("director").map(|p| p.data_type.clone()),
            Some(DataType::Other("Person".to_string()))
        );
    }

    #[test]
    fn test_minimal_class() {
        let dto: ClassDto = serde_json::from_value(json!({ "class": "Bare" })).unwrap();
        let config = dto.into_config();
        assert_eq!(config.vectorizer, "none");
        assert_eq!(config.replication.factor, 1);
        assert_eq!(config.vector_index, VectorIndexConfig::default());
        assert!(!config.multi_tenancy.enabled);
    }

    #[test]
    fn test_create_body() {
        let input = CreateCollection::new("Movies")
            .with_properties(movie_properties())
            .with_vector_index(VectorIndexType::HnswPq.config(10_000))
            .with_vectorizer(Some(Vectorizer::Ollama))
            .with_shards(3);
        let body = create_body(&input);

        assert_eq!(body["class"], "Movies");
        assert_eq!(body["vectorIndexType"], "hnsw");
        assert_eq!(body["vectorIndexConfig"]["pq"]["trainingLimit"], 10_000);
        assert_eq!(body["vectorizer"], "text2vec-ollama");
        assert_eq!(body["moduleConfig"]["text2vec-ollama"]["model"], OLLAMA_MODEL);
        assert_eq!(body["shardingConfig"]["desiredCount"], 3);
        assert_eq!(body["properties"][0]["dataType"][0], "text");
    }

    #[test]
    fn test_single_shard_has_no_sharding_config() {
        let body = create_body(&CreateCollection::new("Movies"));
        assert!(body.get("shardingConfig").is_none());
        assert_eq!(body["vectorizer"], "none");
    }

    #[test]
    fn test_apply_update_keeps_unrelated_fields() {
        let mut class = class_json();
        let update = UpdateCollection {
            description: Some("movies".to_string()),
            vector_index: Some(VectorIndexType::HnswSq.config(5_000)),
            async_replication: Some(false),
            auto_tenant_creation: None,
            auto_tenant_activation: Some(true),
        };
        apply_update(&mut class, &update).unwrap();

        assert_eq!(class["description"], "movies");
        assert_eq!(class["vectorIndexType"], "hnsw");
        assert_eq!(class["vectorIndexConfig"]["sq"]["trainingLimit"], 5_000);
        assert_eq!(class["vectorIndexConfig"]["distance"], "cosine");
        assert_eq!(class["replicationConfig"]["asyncEnabled"], false);
        assert_eq!(class["replicationConfig"]["factor"], 3);
        assert_eq!(class["multiTenancyConfig"]["autoTenantCreation"], true);
        assert_eq!(class["multiTenancyConfig"]["autoTenantActivation"], true);
    }

    #[test]
    fn test_batch_object_carries_tenant() {
        let target = ScopedCollection::new("Movies", TenantScope::tenant("Tenant--1"));
        let object = DataObject::new(Map::new()).with_vector(vec![0.5, 0.25]);
        let body = batch_object(&target, &object);
        assert_eq!(body["tenant"], "Tenant--1");
        assert_eq!(body["vector"][1], 0.25);

        let body = batch_object(&ScopedCollection::unscoped("Movies"), &object);
        assert!(body.get("tenant").is_none());
    }

    #[test]
    fn test_parse_batch_response() {
        let items: Vec<BatchItemDto> = serde_json::from_value(json!([
            { "id": "6a2a1b52-4c1d-4a8b-9d6a-2d0c5f0e3b11", "result": {} },
            {
                "id": "0b7f4c3e-1a2b-4c5d-8e9f-0a1b2c3d4e5f",
                "result": { "errors": { "error": [{ "message": "tenant not found" }] } }
            }
        ]))
        .unwrap();
        let outcome = parse_batch_response(items);
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].message, "tenant not found");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"error":[{"message":"a"},{"message":"b"}]}"#),
            "a; b"
        );
        assert_eq!(error_message("  plain text  "), "plain text");
        assert_eq!(error_message(""), "empty response body");
    }
}
