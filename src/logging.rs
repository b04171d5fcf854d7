use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Error, Result};

/// Installs the global subscriber. `RUST_LOG` overrides `default_filter`.
///
/// Fails instead of panicking when a subscriber is already installed, so
/// embedding applications and tests can call it more than once.
pub fn init_logging(default_filter: &str) -> Result<()> {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| Error::Config(format!("invalid log filter: {e}")))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(false),
        )
        .with(filter_layer)
        .try_init()
        .map_err(|e| Error::Config(e.to_string()))?;

    info!("Tracing is configured.");
    Ok(())
}
