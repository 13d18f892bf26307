use std::sync::Arc;

use domain_weaviate::models::movie_properties;
use domain_weaviate::{
    BackupRequest, BackupService, CollectionService, CreateCollection, DataService, IngestOptions,
    MultiTenancyConfig, QueryOptions, ReplicationConfig, TenantBatch, TenantService,
    UpdateCollectionOptions, UpdateDataOptions, WeaviateClient, WeaviateError,
};
use eyre::{Result, WrapErr};
use tracing::info;

use crate::cli::{
    CancelCommand, Command, CreateCollectionArgs, CreateCommand, DeleteCommand, GetCommand,
    QueryCommand, RestoreCommand, TenantBatchArgs, UpdateCommand,
};
use crate::output;

/// Services wired onto one shared client
pub struct Services {
    collections: CollectionService,
    tenants: TenantService,
    data: DataService,
    backups: BackupService,
}

impl Services {
    pub fn new(client: Arc<WeaviateClient>) -> Self {
        Self {
            collections: CollectionService::new(client.clone(), client.clone(), client.clone()),
            tenants: TenantService::new(client.clone(), client.clone()),
            data: DataService::new(client.clone(), client.clone(), client.clone()),
            backups: BackupService::new(client.clone(), client),
        }
    }
}

fn collection_input(args: CreateCollectionArgs) -> CreateCollection {
    let input = CreateCollection::new(args.collection)
        .with_vector_index(args.vector_index.config(args.training_limit))
        .with_vectorizer(args.vectorizer)
        .with_replication(ReplicationConfig {
            factor: args.replication_factor,
            async_enabled: args.async_enabled,
        })
        .with_shards(args.shards)
        .with_multi_tenancy(MultiTenancyConfig {
            enabled: args.multitenant,
            auto_tenant_creation: args.auto_tenant_creation,
            auto_tenant_activation: args.auto_tenant_activation,
        });
    if args.auto_schema {
        input.with_properties(movie_properties())
    } else {
        input
    }
}

fn tenant_batch(args: TenantBatchArgs) -> TenantBatch {
    TenantBatch {
        collection: args.collection,
        suffix: args.tenant_suffix,
        count: args.number_tenants,
        status: args.state,
    }
}

pub async fn run(services: &Services, command: Command) -> Result<()> {
    match command {
        Command::Create(command) => create(services, command).await,
        Command::Update(command) => update(services, command).await,
        Command::Delete(command) => delete(services, command).await,
        Command::Get(command) => get(services, command).await,
        Command::Query(QueryCommand::Data(args)) => {
            let results = services
                .data
                .query(QueryOptions {
                    request: args.target.request(args.limit),
                    search: args.search_type,
                    query: args.query,
                })
                .await
                .wrap_err("Failed to query data")?;
            print!("{}", output::query_results(&results));
            Ok(())
        }
        Command::Restore(RestoreCommand::Backup(args)) => {
            let descriptor = services
                .backups
                .restore(args.request(), args.wait)
                .await
                .wrap_err_with(|| format!("Failed to restore backup {}", args.target.backup_id))?;
            print!("{}", output::backup(&descriptor));
            Ok(())
        }
        Command::Cancel(CancelCommand::Backup(args)) => {
            let cancelled = services
                .backups
                .cancel(&args.request())
                .await
                .wrap_err_with(|| format!("Failed to cancel backup {}", args.backup_id))?;
            if cancelled {
                println!("Backup {} cancelled", args.backup_id);
            } else {
                println!("Backup {} was not found or already finished", args.backup_id);
            }
            Ok(())
        }
    }
}

async fn create(services: &Services, command: CreateCommand) -> Result<()> {
    match command {
        CreateCommand::Collection(args) => {
            let config = services
                .collections
                .create(collection_input(args))
                .await
                .wrap_err("Failed to create collection")?;
            println!("Collection {} created", config.name);
        }
        CreateCommand::Tenants(args) => {
            let created = services
                .tenants
                .create(tenant_batch(args))
                .await
                .wrap_err("Failed to create tenants")?;
            println!("{} tenants created", created.len());
        }
        CreateCommand::Data(args) => {
            let request = args
                .target
                .request(args.limit)
                .with_auto_tenants(args.auto_tenants);
            let report = services
                .data
                .ingest(IngestOptions {
                    request,
                    randomize: args.randomize,
                    data_file: args.data_file,
                })
                .await
                .wrap_err("Failed to ingest data")?;
            print!("{}", output::fan_out_report("inserted", &report));
        }
        CreateCommand::Backup(args) => {
            let descriptor = services
                .backups
                .create(args.request(), args.wait)
                .await
                .wrap_err_with(|| format!("Failed to create backup {}", args.target.backup_id))?;
            print!("{}", output::backup(&descriptor));
        }
    }
    Ok(())
}

async fn update(services: &Services, command: UpdateCommand) -> Result<()> {
    match command {
        UpdateCommand::Collection(args) => {
            let options = UpdateCollectionOptions {
                description: args.description,
                vector_index: args.vector_index,
                training_limit: args.training_limit,
                async_enabled: args.async_enabled,
                auto_tenant_creation: args.auto_tenant_creation,
                auto_tenant_activation: args.auto_tenant_activation,
            };
            let config = services
                .collections
                .update(&args.collection, options)
                .await
                .wrap_err("Failed to update collection")?;
            println!("Collection {} updated", config.name);
        }
        UpdateCommand::Tenants(args) => {
            let changed = services
                .tenants
                .update(tenant_batch(args))
                .await
                .wrap_err("Failed to update tenants")?;
            println!("{changed} tenants updated");
        }
        UpdateCommand::Data(args) => {
            let report = services
                .data
                .update(UpdateDataOptions {
                    request: args.target.request(args.limit),
                    randomize: args.randomize,
                })
                .await
                .wrap_err("Failed to update data")?;
            print!("{}", output::fan_out_report("updated", &report));
        }
    }
    Ok(())
}

async fn delete(services: &Services, command: DeleteCommand) -> Result<()> {
    match command {
        DeleteCommand::Collection(args) if args.all => {
            let deleted = services
                .collections
                .delete_all()
                .await
                .wrap_err("Failed to delete all collections")?;
            println!("{deleted} collections deleted");
        }
        DeleteCommand::Collection(args) => {
            services
                .collections
                .delete(&args.collection)
                .await
                .wrap_err("Failed to delete collection")?;
            println!("Collection {} deleted", args.collection);
        }
        DeleteCommand::Tenants(args) => {
            let removed = services
                .tenants
                .delete(&args.collection, &args.tenant_suffix, args.number_tenants)
                .await
                .wrap_err("Failed to delete tenants")?;
            println!("{removed} tenants deleted");
        }
        DeleteCommand::Data(args) => {
            let report = services
                .data
                .delete(args.target.request(args.limit))
                .await
                .wrap_err("Failed to delete data")?;
            print!("{}", output::fan_out_report("deleted", &report));
        }
    }
    Ok(())
}

async fn get(services: &Services, command: GetCommand) -> Result<()> {
    match command {
        GetCommand::Collection(args) => match args.collection {
            Some(name) => {
                let config = services
                    .collections
                    .describe(&name)
                    .await
                    .wrap_err("Failed to read collection")?;
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
            None => {
                let summaries = services
                    .collections
                    .summaries()
                    .await
                    .wrap_err("Failed to list collections")?;
                print!("{}", output::collection_summaries(&summaries));
            }
        },
        GetCommand::Tenants(args) => {
            let tenants = services
                .tenants
                .list(&args.collection)
                .await
                .wrap_err("Failed to list tenants")?;
            print!("{}", output::tenants(&tenants, args.verbose));
        }
        GetCommand::Backup(args) => {
            let Some(backup_id) = args.backup_id else {
                return Err(WeaviateError::Unsupported(
                    "listing backups is not supported, pass --backup-id".to_string(),
                )
                .into());
            };
            info!(%backup_id, restore = args.restore, "Reading backup status");
            let request = BackupRequest::new(args.backend, backup_id);
            let descriptor = services
                .backups
                .status(&request, args.restore)
                .await
                .wrap_err("Failed to read backup status")?;
            print!("{}", output::backup(&descriptor));
        }
    }
    Ok(())
}
