use std::fmt;

use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse_or};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_GRPC_PORT: u16 = 50051;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Hostname a container uses to reach services published on the host
pub const DOCKER_HOST: &str = "host.docker.internal";

/// Connection settings for a Weaviate server.
///
/// `host = "localhost"` means a local deployment on `port`; anything else is
/// treated as a cluster URL.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Carried for deployments that publish both ports. The REST adapter
    /// does not use it.
    pub grpc_port: u16,
    pub api_key: Option<String>,
    /// Forwarded as `X-OpenAI-Api-Key` for `text2vec-openai` collections
    pub openai_api_key: Option<String>,
    pub timeout_secs: u64,
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_grpc_port(mut self, grpc_port: u16) -> Self {
        self.grpc_port = grpc_port;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn is_local(&self) -> bool {
        self.host == DEFAULT_HOST
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            grpc_port: DEFAULT_GRPC_PORT,
            api_key: None,
            openai_api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "***");
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("grpc_port", &self.grpc_port)
            .field("api_key", &redact(&self.api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FromEnv for ConnectionConfig {
    /// Reads `WEAVIATE_HOST`, `WEAVIATE_PORT`, `WEAVIATE_GRPC_PORT`,
    /// `WEAVIATE_API_KEY`, `WEAVIATE_TIMEOUT_SECS` and `OPENAI_APIKEY`.
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_or_default("WEAVIATE_HOST", DEFAULT_HOST),
            port: env_parse_or("WEAVIATE_PORT", DEFAULT_PORT)?,
            grpc_port: env_parse_or("WEAVIATE_GRPC_PORT", DEFAULT_GRPC_PORT)?,
            api_key: env_optional("WEAVIATE_API_KEY"),
            openai_api_key: env_optional("OPENAI_APIKEY"),
            timeout_secs: env_parse_or("WEAVIATE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        })
    }
}

/// Base URL for a non-local host: kept as is when it has a scheme,
/// otherwise served over https.
pub fn cluster_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert_eq!(config.grpc_port, 50051);
        assert!(config.is_local());
    }

    #[test]
    fn test_from_env() {
        temp_env::with_vars(
            [
                ("WEAVIATE_HOST", Some("my-cluster.weaviate.cloud")),
                ("WEAVIATE_PORT", Some("443")),
                ("WEAVIATE_GRPC_PORT", None),
                ("WEAVIATE_API_KEY", Some("secret")),
                ("WEAVIATE_TIMEOUT_SECS", None),
                ("OPENAI_APIKEY", Some("sk-test")),
            ],
            || {
                let config = ConnectionConfig::from_env().unwrap();
                assert_eq!(config.host, "my-cluster.weaviate.cloud");
                assert_eq!(config.port, 443);
                assert_eq!(config.grpc_port, DEFAULT_GRPC_PORT);
                assert_eq!(config.api_key.as_deref(), Some("secret"));
                assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
                assert!(!config.is_local());
            },
        );
    }

    #[test]
    fn test_from_env_rejects_bad_port() {
        temp_env::with_var("WEAVIATE_PORT", Some("http"), || {
            assert!(ConnectionConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = ConnectionConfig::new("cluster").with_api_key("super-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_cluster_url() {
        assert_eq!(cluster_url("abc.weaviate.network"), "https://abc.weaviate.network");
        assert_eq!(cluster_url("http://10.0.0.5:8080/"), "http://10.0.0.5:8080");
        assert_eq!(cluster_url("https://abc.gcp.weaviate.cloud"), "https://abc.gcp.weaviate.cloud");
    }
}
