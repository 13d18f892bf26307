use crate::Environment;
use tracing::debug;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Install color-eyre with the project-standard configuration.
///
/// Call this first in `main()`. Safe to call multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Map a `-v` count onto the default filter directive.
///
/// `0` keeps the output to progress lines, `1` adds per-request detail and
/// anything higher turns on everything.
pub fn verbosity_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize tracing for a command-line process.
///
/// Events go to **stderr** so stdout only carries command output (tables,
/// JSON dumps) and can be piped.
///
/// - **Production** (`APP_ENV=production`): JSON lines, no targets.
/// - **Development** (default): compact human-readable lines.
///
/// `RUST_LOG` overrides `default_directive` when set. An `ErrorLayer` is
/// installed in both modes so `color-eyre` reports carry span traces.
///
/// Calling this more than once is a no-op after the first success.
pub fn init_tracing(environment: &Environment, default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let result = if environment.is_production() {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    if result.is_err() {
        debug!("Tracing already initialized, skipping re-initialization");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_directive() {
        assert_eq!(verbosity_directive(0), "info");
        assert_eq!(verbosity_directive(1), "debug");
        assert_eq!(verbosity_directive(7), "trace");
    }

    #[test]
    fn test_init_tracing_multiple_calls() {
        init_tracing(&Environment::Development, "info");
        init_tracing(&Environment::Production, "warn");
    }

    #[test]
    fn test_init_tracing_with_rust_log_env() {
        temp_env::with_var("RUST_LOG", Some("domain_weaviate=debug"), || {
            init_tracing(&Environment::Development, "info");
        });
    }
}
