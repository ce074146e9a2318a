//! proxyhub-jobs: run one periodic job and exit.
//!
//! Intended for an external cron scheduler:
//!
//! ```text
//! proxyhub-jobs expire-orders
//! proxyhub-jobs release-earnings
//! proxyhub-jobs sample-uptime
//! proxyhub-jobs evaluate-sla
//! ```

use chrono::Utc;
use tracing::{error, info};

use proxyhub::config::Config;
use proxyhub::services::Job;
use proxyhub::utils::bootstrap::{build_app, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let Some(name) = std::env::args().nth(1) else {
        let names: Vec<&str> = Job::ALL.iter().map(Job::name).collect();
        return Err(format!("usage: proxyhub-jobs <{}>", names.join("|")).into());
    };
    let job: Job = name.parse()?;

    let config = Config::load(None).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;
    let app = build_app(&config).await?;

    info!(job = %job, "Running job");
    let outcome = app.scheduler.run_job(job, Utc::now()).await.map_err(|e| {
        error!(job = %job, error = %e, "Job failed");
        e
    })?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
