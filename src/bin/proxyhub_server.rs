//! proxyhub-server: REST API and, optionally, the periodic jobs.
//!
//! ## Configuration
//! - `config.yaml` in the working directory, or `PROXYHUB_CONFIG`
//! - `PROXYHUB__SECTION__KEY` environment overrides, e.g.
//!   `PROXYHUB__SERVER__PORT=9000`
//! - `PROXYHUB__JOBS__ENABLED=true` runs the job scheduler in-process
//! - `PROXYHUB_LOG` sets the log filter (default: info)

use tracing::{error, info};

use proxyhub::config::Config;
use proxyhub::handlers::rest;
use proxyhub::utils::bootstrap::{build_app, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting proxyhub-server");

    let config = Config::load(None).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    let app = build_app(&config).await?;

    let jobs = if config.jobs.enabled {
        app.scheduler.spawn()
    } else {
        info!("Job scheduler disabled, run jobs with proxyhub-jobs");
        Vec::new()
    };

    let result = rest::serve(app, &config.server.bind_address()).await;

    for job in jobs {
        job.abort();
    }
    result.map_err(|e| {
        error!(error = %e, "REST server failed");
        e as Box<dyn std::error::Error>
    })?;

    info!("proxyhub-server stopped");
    Ok(())
}
