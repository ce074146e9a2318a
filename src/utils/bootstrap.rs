//! Bootstrap utilities for proxyhub binaries.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LOG_ENV_VAR};
use crate::services::App;
use crate::storage::init_storage;

/// Initialize tracing with the PROXYHUB_LOG environment variable.
///
/// Defaults to "info" level if PROXYHUB_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Open storage and wire every service with the HTTP collaborators.
pub async fn build_app(config: &Config) -> Result<Arc<App>, Box<dyn std::error::Error>> {
    let store = init_storage(&config.storage).await?;
    let app = App::from_config(config, store)?;
    info!("Services initialised");
    Ok(Arc::new(app))
}
