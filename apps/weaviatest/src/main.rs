//! weaviatest
//!
//! Admin CLI for exercising a Weaviate cluster: collections, tenants, data
//! and backups. Data commands fan out over every tenant of a collection.

use std::sync::Arc;

use clap::Parser;
use core_config::tracing::{init_tracing, install_color_eyre, verbosity_directive};
use core_config::{Environment, FromEnv};
use domain_weaviate::{ConnectionConfig, WeaviateClient};
use eyre::{Result, WrapErr};
use tracing::info;

mod cli;
mod commands;
mod output;

use cli::Cli;
use commands::Services;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    init_tracing(&Environment::from_env(), verbosity_directive(cli.verbosity));

    let config = ConnectionConfig::from_env().wrap_err("Invalid Weaviate configuration")?;
    let config = cli.connection.apply(config);

    let client = WeaviateClient::connect(config)
        .await
        .wrap_err("Failed to connect to Weaviate")?;
    info!(version = %client.version(), "Server ready");

    let services = Services::new(Arc::new(client));
    commands::run(&services, cli.command).await
}
