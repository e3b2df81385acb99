//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, ConfigResult};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` overrides `filter` when set. Returns `false` if a subscriber
/// was already installed (tests, embedding applications).
pub fn init_tracing(filter: &str) -> ConfigResult<bool> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => EnvFilter::try_new(filter).map_err(|e| ConfigError::LogFilter {
            filter: filter.to_string(),
            reason: e.to_string(),
        })?,
    };

    Ok(tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok())
}
