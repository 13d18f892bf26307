pub mod tracing;

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime environment, selects the log format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env_or_default("APP_ENV", "development");

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Load an environment variable, falling back to `default` when unset
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Load an environment variable or return [`ConfigError::MissingEnvVar`]
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Load an environment variable, treating empty values as unset
pub fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an environment variable into `T`, using `default` when unset.
///
/// A value that is present but unparsable is an error rather than a silent
/// fallback, so a typo in `WEAVIATE_PORT` surfaces at startup.
pub fn env_parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("WEAVIATEST_HOST_OVERRIDE", Some("cluster.example"), || {
            assert_eq!(
                env_or_default("WEAVIATEST_HOST_OVERRIDE", "localhost"),
                "cluster.example"
            );
        });
        temp_env::with_var_unset("WEAVIATEST_HOST_OVERRIDE", || {
            assert_eq!(env_or_default("WEAVIATEST_HOST_OVERRIDE", "localhost"), "localhost");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("WEAVIATEST_REQUIRED", || {
            let err = env_required("WEAVIATEST_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("WEAVIATEST_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_optional_ignores_blank_values() {
        temp_env::with_var("WEAVIATEST_BLANK_API_KEY", Some("   "), || {
            assert_eq!(env_optional("WEAVIATEST_BLANK_API_KEY"), None);
        });
        temp_env::with_var("WEAVIATEST_BLANK_API_KEY", Some("secret"), || {
            assert_eq!(
                env_optional("WEAVIATEST_BLANK_API_KEY").as_deref(),
                Some("secret")
            );
        });
    }

    #[test]
    fn test_env_parse_or() {
        temp_env::with_var("WEAVIATEST_PORT_OVERRIDE", Some(" 8081 "), || {
            assert_eq!(env_parse_or("WEAVIATEST_PORT_OVERRIDE", 8080u16).unwrap(), 8081);
        });
        temp_env::with_var_unset("WEAVIATEST_PORT_OVERRIDE", || {
            assert_eq!(env_parse_or("WEAVIATEST_PORT_OVERRIDE", 8080u16).unwrap(), 8080);
        });
    }

    #[test]
    fn test_env_parse_or_rejects_garbage() {
        temp_env::with_var("WEAVIATEST_PORT_OVERRIDE", Some("eighty"), || {
            let err = env_parse_or("WEAVIATEST_PORT_OVERRIDE", 8080u16).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "WEAVIATEST_PORT_OVERRIDE"));
        });
    }
}
