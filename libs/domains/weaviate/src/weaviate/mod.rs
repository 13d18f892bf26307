//! REST adapter for a Weaviate server.
//!
//! [`WeaviateClient`] implements every client trait over the `/v1` REST and
//! GraphQL endpoints. Server error bodies are turned into [`WeaviateError`]
//! values by [`classify_error`], which is the only place that inspects
//! message text.

mod client;
mod config;
mod graphql;
mod schema;

pub use client::WeaviateClient;
pub use config::{
    ConnectionConfig, DEFAULT_GRPC_PORT, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS,
    DOCKER_HOST, cluster_url,
};

use crate::error::WeaviateError;

const MULTI_TENANCY_DISABLED: &str = "multi-tenancy is not enabled";

/// Map a failed response onto an error for `collection`.
pub fn classify_error(status: Option<u16>, message: String, collection: &str) -> WeaviateError {
    if message.to_lowercase().contains(MULTI_TENANCY_DISABLED) {
        return WeaviateError::MultiTenancyDisabled(collection.to_string());
    }
    WeaviateError::BackendRequestFailed { status, message }
}
