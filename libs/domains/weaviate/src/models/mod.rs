mod backup;
mod collection;
mod data;
mod tenant;
mod version;

pub use backup::{BackupBackend, BackupDescriptor, BackupRequest, BackupStatus, parse_collection_list};
pub use collection::{
    CollectionConfig, CreateCollection, DataType, IndexAlgorithm, MultiTenancyConfig, OLLAMA_MODEL,
    Property, Quantizer, ReplicationConfig, UpdateCollection, VectorIndexConfig, VectorIndexType,
    Vectorizer, movie_properties, vector_dimensions,
};
pub use data::{
    BatchFailure, BatchOutcome, ConsistencyLevel, DataObject, QueryObject, SearchType,
};
pub use tenant::{ScopedCollection, Tenant, TenantActivityStatus, TenantScope};
pub use version::ServerVersion;
