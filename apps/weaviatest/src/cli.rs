use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use domain_weaviate::models::parse_collection_list;
use domain_weaviate::operations::{
    DEFAULT_BACKUP_ID, DEFAULT_CPU_PERCENTAGE, DEFAULT_DATA_FILE, DEFAULT_TENANT_SUFFIX,
};
use domain_weaviate::{
    BackupBackend, BackupRequest, ConnectionConfig, ConsistencyLevel, FanOutRequest, SearchType,
    TenantActivityStatus, VectorIndexType, Vectorizer,
};

const DEFAULT_COLLECTION: &str = "Movies";

#[derive(Parser, Debug)]
#[command(
    name = "weaviatest",
    version,
    about = "Exercise a Weaviate cluster: collections, tenants, data and backups"
)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long = "verbosity", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the `WEAVIATE_*` environment settings
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Weaviate host, `localhost` for a local deployment or a cluster URL
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// REST port of a local deployment
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// gRPC port of a local deployment
    #[arg(long, global = true)]
    pub grpc_port: Option<u16>,

    /// API key sent as a bearer token
    #[arg(long, alias = "api_key", global = true)]
    pub api_key: Option<String>,
}

impl ConnectionArgs {
    pub fn apply(self, mut config: ConnectionConfig) -> ConnectionConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(grpc_port) = self.grpc_port {
            config = config.with_grpc_port(grpc_port);
        }
        if let Some(api_key) = self.api_key {
            config = config.with_api_key(api_key);
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a collection, tenants, data or a backup
    #[command(subcommand)]
    Create(CreateCommand),

    /// Update a collection, tenants or data
    #[command(subcommand)]
    Update(UpdateCommand),

    /// Delete a collection, tenants or data
    #[command(subcommand)]
    Delete(DeleteCommand),

    /// Show collections, tenants or a backup
    #[command(subcommand)]
    Get(GetCommand),

    /// Search data
    #[command(subcommand)]
    Query(QueryCommand),

    /// Restore a backup
    #[command(subcommand)]
    Restore(RestoreCommand),

    /// Cancel a running backup
    #[command(subcommand)]
    Cancel(CancelCommand),
}

#[derive(Subcommand, Debug)]
pub enum CreateCommand {
    Collection(CreateCollectionArgs),
    Tenants(TenantBatchArgs),
    Data(CreateDataArgs),
    Backup(CreateBackupArgs),
}

#[derive(Subcommand, Debug)]
pub enum UpdateCommand {
    Collection(UpdateCollectionArgs),
    Tenants(TenantBatchArgs),
    Data(UpdateDataArgs),
}

#[derive(Subcommand, Debug)]
pub enum DeleteCommand {
    Collection(DeleteCollectionArgs),
    Tenants(DeleteTenantsArgs),
    Data(DeleteDataArgs),
}

#[derive(Subcommand, Debug)]
pub enum GetCommand {
    Collection(GetCollectionArgs),
    Tenants(GetTenantsArgs),
    Backup(GetBackupArgs),
}

#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    Data(QueryDataArgs),
}

#[derive(Subcommand, Debug)]
pub enum RestoreCommand {
    Backup(RestoreBackupArgs),
}

#[derive(Subcommand, Debug)]
pub enum CancelCommand {
    Backup(BackupTargetArgs),
}

// ============================================================================
// Collections
// ============================================================================

#[derive(Args, Debug)]
pub struct CreateCollectionArgs {
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    #[arg(long, default_value_t = 3)]
    pub replication_factor: u32,

    /// Enable async replication
    #[arg(long)]
    pub async_enabled: bool,

    /// hnsw, flat, hnsw_pq, hnsw_bq, hnsw_bq_cache, hnsw_sq, flat_pq, flat_sq, flat_bq or flat_bq_cache
    #[arg(long, default_value = "hnsw")]
    pub vector_index: VectorIndexType,

    /// Training limit for pq and sq compression
    #[arg(long, default_value_t = 10_000)]
    pub training_limit: u64,

    #[arg(long)]
    pub multitenant: bool,

    #[arg(long)]
    pub auto_tenant_creation: bool,

    #[arg(long)]
    pub auto_tenant_activation: bool,

    /// Define the movie properties up front instead of relying on auto-schema
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub auto_schema: bool,

    #[arg(long, default_value_t = 1)]
    pub shards: u32,

    /// contextionary, transformers, openai or ollama
    #[arg(long)]
    pub vectorizer: Option<Vectorizer>,
}

#[derive(Args, Debug)]
pub struct UpdateCollectionArgs {
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    #[arg(long)]
    pub description: Option<String>,

    /// hnsw, flat, hnsw_pq, hnsw_sq, hnsw_bq or flat_bq
    #[arg(long)]
    pub vector_index: Option<VectorIndexType>,

    #[arg(long, default_value_t = 10_000)]
    pub training_limit: u64,

    #[arg(long)]
    pub async_enabled: Option<bool>,

    #[arg(long)]
    pub auto_tenant_creation: Option<bool>,

    #[arg(long)]
    pub auto_tenant_activation: Option<bool>,
}

#[derive(Args, Debug)]
pub struct DeleteCollectionArgs {
    #[arg(long, default_value = DEFAULT_COLLECTION, conflicts_with = "all")]
    pub collection: String,

    /// Delete every collection on the server
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug)]
pub struct GetCollectionArgs {
    /// Print one collection's configuration instead of the overview
    #[arg(long)]
    pub collection: Option<String>,
}

// ============================================================================
// Tenants
// ============================================================================

#[derive(Args, Debug)]
pub struct TenantBatchArgs {
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    #[arg(long, default_value = DEFAULT_TENANT_SUFFIX)]
    pub tenant_suffix: String,

    #[arg(long, default_value_t = 100)]
    pub number_tenants: usize,

    /// hot, active, cold, inactive, frozen or offloaded
    #[arg(long, default_value = "active")]
    pub state: TenantActivityStatus,
}

#[derive(Args, Debug)]
pub struct DeleteTenantsArgs {
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    #[arg(long, default_value = DEFAULT_TENANT_SUFFIX)]
    pub tenant_suffix: String,

    #[arg(long, default_value_t = 100)]
    pub number_tenants: usize,
}

#[derive(Args, Debug)]
pub struct GetTenantsArgs {
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// List every tenant with its state instead of the counts
    #[arg(long)]
    pub verbose: bool,
}

// ============================================================================
// Data
// ============================================================================

/// Target of a data command
#[derive(Args, Debug)]
pub struct DataTargetArgs {
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// one, quorum or all
    #[arg(long, default_value = "quorum")]
    pub consistency_level: ConsistencyLevel,
}

impl DataTargetArgs {
    pub fn request(&self, limit: usize) -> FanOutRequest {
        FanOutRequest::new(self.collection.clone(), limit, self.consistency_level)
    }
}

#[derive(Args, Debug)]
pub struct CreateDataArgs {
    #[command(flatten)]
    pub target: DataTargetArgs,

    /// Objects per tenant
    #[arg(long, default_value_t = 1000)]
    pub limit: usize,

    /// Generate random movies instead of reading the data file
    #[arg(long)]
    pub randomize: bool,

    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,

    /// Ingest into this many tenants, creating the missing ones
    #[arg(long, default_value_t = 0)]
    pub auto_tenants: usize,
}

#[derive(Args, Debug)]
pub struct UpdateDataArgs {
    #[command(flatten)]
    pub target: DataTargetArgs,

    #[arg(long, default_value_t = 100)]
    pub limit: usize,

    /// Replace objects with new random movies instead of mutating them
    #[arg(long)]
    pub randomize: bool,
}

#[derive(Args, Debug)]
pub struct DeleteDataArgs {
    #[command(flatten)]
    pub target: DataTargetArgs,

    #[arg(long, default_value_t = 100)]
    pub limit: usize,
}

#[derive(Args, Debug)]
pub struct QueryDataArgs {
    #[command(flatten)]
    pub target: DataTargetArgs,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// fetch, vector, keyword or hybrid
    #[arg(long, default_value = "fetch")]
    pub search_type: SearchType,

    /// Search text, ignored by fetch
    #[arg(long, default_value = "Action movie")]
    pub query: String,
}

// ============================================================================
// Backups
// ============================================================================

#[derive(Args, Debug)]
pub struct BackupTargetArgs {
    /// s3, gcs or filesystem
    #[arg(long, default_value = "s3")]
    pub backend: BackupBackend,

    #[arg(long, default_value = DEFAULT_BACKUP_ID)]
    pub backup_id: String,
}

impl BackupTargetArgs {
    pub fn request(&self) -> BackupRequest {
        BackupRequest::new(self.backend, self.backup_id.clone())
    }
}

#[derive(Args, Debug)]
pub struct CreateBackupArgs {
    #[command(flatten)]
    pub target: BackupTargetArgs,

    /// Comma separated collections to include, all when omitted
    #[arg(long, conflicts_with = "exclude")]
    pub include: Option<String>,

    /// Comma separated collections to leave out
    #[arg(long)]
    pub exclude: Option<String>,

    /// Block until the backup finishes
    #[arg(long)]
    pub wait: bool,

    /// Share of CPU the server may spend on the backup
    #[arg(long, default_value_t = DEFAULT_CPU_PERCENTAGE, value_parser = clap::value_parser!(u8).range(1..=80))]
    pub cpu_for_backup: u8,
}

impl CreateBackupArgs {
    pub fn request(&self) -> BackupRequest {
        let mut request = self.target.request();
        request.include = parse_collection_list(self.include.as_deref());
        request.exclude = parse_collection_list(self.exclude.as_deref());
        request.cpu_percentage = Some(self.cpu_for_backup);
        request
    }
}

#[derive(Args, Debug)]
pub struct RestoreBackupArgs {
    #[command(flatten)]
    pub target: BackupTargetArgs,

    #[arg(long, conflicts_with = "exclude")]
    pub include: Option<String>,

    #[arg(long)]
    pub exclude: Option<String>,

    #[arg(long)]
    pub wait: bool,
}

impl RestoreBackupArgs {
    pub fn request(&self) -> BackupRequest {
        let mut request = self.target.request();
        request.include = parse_collection_list(self.include.as_deref());
        request.exclude = parse_collection_list(self.exclude.as_deref());
        request
    }
}

#[derive(Args, Debug)]
pub struct GetBackupArgs {
    /// s3, gcs or filesystem
    #[arg(long, default_value = "s3")]
    pub backend: BackupBackend,

    #[arg(long)]
    pub backup_id: Option<String>,

    /// Show the restore status instead of the backup status
    #[arg(long)]
    pub restore: bool,
}
