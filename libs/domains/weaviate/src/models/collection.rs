use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Property data type. Unknown server types are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    Text,
    TextArray,
    Number,
    NumberArray,
    Int,
    IntArray,
    Boolean,
    BooleanArray,
    Date,
    DateArray,
    Uuid,
    UuidArray,
    Other(String),
}

impl DataType {
    pub fn as_str(&self) -> &str {
        match self {
            DataType::Text => "text",
            DataType::TextArray => "text[]",
            DataType::Number => "number",
            DataType::NumberArray => "number[]",
            DataType::Int => "int",
            DataType::IntArray => "int[]",
            DataType::Boolean => "boolean",
            DataType::BooleanArray => "boolean[]",
            DataType::Date => "date",
            DataType::DateArray => "date[]",
            DataType::Uuid => "uuid",
            DataType::UuidArray => "uuid[]",
            DataType::Other(raw) => raw,
        }
    }

    /// Whether a GraphQL `Get` can select the property without a sub-selection.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, DataType::Other(_))
    }
}

impl From<String> for DataType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "text" | "string" => DataType::Text,
            "text[]" | "string[]" => DataType::TextArray,
            "number" => DataType::Number,
            "number[]" => DataType::NumberArray,
            "int" => DataType::Int,
            "int[]" => DataType::IntArray,
            "boolean" => DataType::Boolean,
            "boolean[]" => DataType::BooleanArray,
            "date" => DataType::Date,
            "date[]" => DataType::DateArray,
            "uuid" => DataType::Uuid,
            "uuid[]" => DataType::UuidArray,
            _ => DataType::Other(raw),
        }
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.as_str().to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub name: String,
    pub data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            description: None,
        }
    }
}

/// Properties of the movie data set used by `create data`.
pub fn movie_properties() -> Vec<Property> {
    [
        ("title", DataType::Text),
        ("genres", DataType::Text),
        ("keywords", DataType::Text),
        ("director", DataType::Text),
        ("popularity", DataType::Number),
        ("runtime", DataType::Text),
        ("cast", DataType::Text),
        ("originalLanguage", DataType::Text),
        ("tagline", DataType::Text),
        ("budget", DataType::Number),
        ("releaseDate", DataType::Date),
        ("revenue", DataType::Number),
        ("status", DataType::Text),
    ]
    .into_iter()
    .map(|(name, data_type)| Property::new(name, data_type))
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IndexAlgorithm {
    #[default]
    Hnsw,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Quantizer {
    Pq { training_limit: u64 },
    Bq { cache: bool },
    Sq { training_limit: u64 },
}

impl Quantizer {
    pub fn name(&self) -> &'static str {
        match self {
            Quantizer::Pq { .. } => "pq",
            Quantizer::Bq { .. } => "bq",
            Quantizer::Sq { .. } => "sq",
        }
    }
}

/// Resolved vector index settings: algorithm plus optional compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorIndexConfig {
    pub algorithm: IndexAlgorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantizer: Option<Quantizer>,
}

impl VectorIndexConfig {
    /// Short label such as `hnsw` or `flat_bq`.
    pub fn label(&self) -> String {
        match &self.quantizer {
            Some(quantizer) => format!("{}_{}", self.algorithm, quantizer.name()),
            None => self.algorithm.to_string(),
        }
    }
}

/// Vector index presets accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum VectorIndexType {
    #[default]
    Hnsw,
    Flat,
    HnswPq,
    HnswBq,
    HnswBqCache,
    HnswSq,
    FlatPq,
    FlatSq,
    FlatBq,
    FlatBqCache,
}

impl VectorIndexType {
    /// Build the index settings. `training_limit` only affects pq and sq.
    pub fn config(self, training_limit: u64) -> VectorIndexConfig {
        let (algorithm, quantizer) = match self {
            VectorIndexType::Hnsw => (IndexAlgorithm::Hnsw, None),
            VectorIndexType::Flat => (IndexAlgorithm::Flat, None),
            VectorIndexType::HnswPq => (
                IndexAlgorithm::Hnsw,
                Some(Quantizer::Pq { training_limit }),
            ),
            VectorIndexType::HnswBq => (IndexAlgorithm::Hnsw, Some(Quantizer::Bq { cache: false })),
            VectorIndexType::HnswBqCache => {
                (IndexAlgorithm::Hnsw, Some(Quantizer::Bq { cache: true }))
            }
            VectorIndexType::HnswSq => (
                IndexAlgorithm::Hnsw,
                Some(Quantizer::Sq { training_limit }),
            ),
            VectorIndexType::FlatPq => (
                IndexAlgorithm::Flat,
                Some(Quantizer::Pq { training_limit }),
            ),
            VectorIndexType::FlatSq => (
                IndexAlgorithm::Flat,
                Some(Quantizer::Sq { training_limit }),
            ),
            VectorIndexType::FlatBq => (IndexAlgorithm::Flat, Some(Quantizer::Bq { cache: false })),
            VectorIndexType::FlatBqCache => {
                (IndexAlgorithm::Flat, Some(Quantizer::Bq { cache: true }))
            }
        };
        VectorIndexConfig {
            algorithm,
            quantizer,
        }
    }

    /// Presets that an existing collection can be switched to.
    pub fn is_reconfigurable(self) -> bool {
        matches!(
            self,
            VectorIndexType::Hnsw
                | VectorIndexType::Flat
                | VectorIndexType::HnswPq
                | VectorIndexType::HnswSq
                | VectorIndexType::HnswBq
                | VectorIndexType::FlatBq
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Vectorizer {
    Contextionary,
    Transformers,
    Openai,
    Ollama,
}

pub const OLLAMA_MODEL: &str = "snowflake-arctic-embed:33m";

impl Vectorizer {
    pub fn module_name(self) -> &'static str {
        match self {
            Vectorizer::Contextionary => "text2vec-contextionary",
            Vectorizer::Transformers => "text2vec-transformers",
            Vectorizer::Openai => "text2vec-openai",
            Vectorizer::Ollama => "text2vec-ollama",
        }
    }
}

/// Vector length produced by a vectorizer module, used to size random vectors.
pub fn vector_dimensions(vectorizer: &str) -> usize {
    match vectorizer {
        "text2vec-contextionary" => 300,
        "text2vec-transformers" => 768,
        _ => 1536,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiTenancyConfig {
    pub enabled: bool,
    pub auto_tenant_creation: bool,
    pub auto_tenant_activation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationConfig {
    pub factor: u32,
    pub async_enabled: bool,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            factor: 1,
            async_enabled: false,
        }
    }
}

/// Collection configuration as read back from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub properties: Vec<Property>,
    pub vector_index: VectorIndexConfig,
    pub vectorizer: String,
    pub replication: ReplicationConfig,
    pub shards: u32,
    pub multi_tenancy: MultiTenancyConfig,
}

impl CollectionConfig {
    pub fn vector_dimensions(&self) -> usize {
        vector_dimensions(&self.vectorizer)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Input for creating a collection
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCollection {
    pub name: String,
    pub description: Option<String>,
    pub properties: Vec<Property>,
    pub vector_index: VectorIndexConfig,
    pub vectorizer: Option<Vectorizer>,
    pub replication: ReplicationConfig,
    pub shards: u32,
    pub multi_tenancy: MultiTenancyConfig,
}

impl CreateCollection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            properties: Vec::new(),
            vector_index: VectorIndexConfig::default(),
            vectorizer: None,
            replication: ReplicationConfig::default(),
            shards: 1,
            multi_tenancy: MultiTenancyConfig::default(),
        }
    }

    pub fn with_properties(mut self, properties: Vec<Property>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_vector_index(mut self, vector_index: VectorIndexConfig) -> Self {
        self.vector_index = vector_index;
        self
    }

    pub fn with_vectorizer(mut self, vectorizer: Option<Vectorizer>) -> Self {
        self.vectorizer = vectorizer;
        self
    }

    pub fn with_replication(mut self, replication: ReplicationConfig) -> Self {
        self.replication = replication;
        self
    }

    pub fn with_shards(mut self, shards: u32) -> Self {
        self.shards = shards;
        self
    }

    pub fn with_multi_tenancy(mut self, multi_tenancy: MultiTenancyConfig) -> Self {
        self.multi_tenancy = multi_tenancy;
        self
    }
}

/// Partial update of a collection's mutable settings. `None` leaves the
/// current value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCollection {
    pub description: Option<String>,
    pub vector_index: Option<VectorIndexConfig>,
    pub async_replication: Option<bool>,
    pub auto_tenant_creation: Option<bool>,
    pub auto_tenant_activation: Option<bool>,
}

impl UpdateCollection {
    pub fn is_empty(&self) -> bool {
        self == &UpdateCollection::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_vector_index_presets() {
        let config = VectorIndexType::from_str("hnsw_pq").unwrap().config(10_000);
        assert_eq!(config.algorithm, IndexAlgorithm::Hnsw);
        assert_eq!(
            config.quantizer,
            Some(Quantizer::Pq {
                training_limit: 10_000
            })
        );
        assert_eq!(config.label(), "hnsw_pq");

        let config = VectorIndexType::FlatBqCache.config(10_000);
        assert_eq!(config.algorithm, IndexAlgorithm::Flat);
        assert_eq!(config.quantizer, Some(Quantizer::Bq { cache: true }));
        assert_eq!(config.label(), "flat_bq");

        assert_eq!(VectorIndexType::Flat.config(5).label(), "flat");
        assert!(VectorIndexType::from_str("ivf").is_err());
    }

    #[test]
    fn test_reconfigurable_presets() {
        assert!(VectorIndexType::HnswSq.is_reconfigurable());
        assert!(VectorIndexType::FlatBq.is_reconfigurable());
        assert!(!VectorIndexType::FlatPq.is_reconfigurable());
        assert!(!VectorIndexType::HnswBqCache.is_reconfigurable());
    }

    #[test]
    fn test_vector_dimensions_by_vectorizer() {
        assert_eq!(vector_dimensions(Vectorizer::Contextionary.module_name()), 300);
        assert_eq!(vector_dimensions(Vectorizer::Transformers.module_name()), 768);
        assert_eq!(vector_dimensions(Vectorizer::Openai.module_name()), 1536);
        assert_eq!(vector_dimensions("none"), 1536);
    }

    #[test]
    fn test_data_type_strings() {
        let property: Property =
            serde_json::from_str(r#"{"name":"tags","dataType":"text[]"}"#).unwrap();
        assert_eq!(property.data_type, DataType::TextArray);
        assert_eq!(DataType::from("geoCoordinates".to_string()).as_str(), "geoCoordinates");
        assert!(!DataType::Other("Author".to_string()).is_primitive());
    }

    #[test]
    fn test_movie_properties() {
        let properties = movie_properties();
        assert_eq!(properties.len(), 13);
        let release = properties.iter().find(|p| p.name == "releaseDate").unwrap();
        assert_eq!(release.data_type, DataType::Date);
    }

    #[test]
    fn test_update_collection_is_empty() {
        assert!(UpdateCollection::default().is_empty());
        let update = UpdateCollection {
            async_replication: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
