//! Periodic jobs.
//!
//! Every job is independent and safe to run concurrently with itself; the
//! scheduler only decides when. Runs can also be triggered on demand.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::config::JobsConfig;
use crate::error::{Result, ServiceError};
use crate::model::SlaCredit;

use super::fulfillment::FulfillmentService;
use super::referral::{ReferralService, SweepReport};
use super::sla::{SampleReport, SlaService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    ExpireOrders,
    ReleaseEarnings,
    SampleUptime,
    EvaluateSla,
}

impl Job {
    pub const ALL: [Job; 4] = [
        Job::ExpireOrders,
        Job::ReleaseEarnings,
        Job::SampleUptime,
        Job::EvaluateSla,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Job::ExpireOrders => "expire-orders",
            Job::ReleaseEarnings => "release-earnings",
            Job::SampleUptime => "sample-uptime",
            Job::EvaluateSla => "evaluate-sla",
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Job {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        Job::ALL
            .into_iter()
            .find(|job| job.name() == s)
            .ok_or_else(|| ServiceError::not_found(format!("job {}", s)))
    }
}

/// What a job run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "job", rename_all = "kebab-case")]
pub enum JobOutcome {
    ExpireOrders { expired: u64 },
    ReleaseEarnings(SweepReport),
    SampleUptime(SampleReport),
    EvaluateSla { credits: Vec<SlaCredit> },
}

pub struct JobScheduler {
    fulfillment: Arc<FulfillmentService>,
    referral: Arc<ReferralService>,
    sla: Arc<SlaService>,
    config: JobsConfig,
}

impl JobScheduler {
    pub fn new(
        fulfillment: Arc<FulfillmentService>,
        referral: Arc<ReferralService>,
        sla: Arc<SlaService>,
        config: JobsConfig,
    ) -> Self {
        Self {
            fulfillment,
            referral,
            sla,
            config,
        }
    }

    /// Run one job to completion.
    pub async fn run_job(&self, job: Job, now: DateTime<Utc>) -> Result<JobOutcome> {
        let outcome = match job {
            Job::ExpireOrders => JobOutcome::ExpireOrders {
                expired: self.fulfillment.expire_orders(now).await?,
            },
            Job::ReleaseEarnings => JobOutcome::ReleaseEarnings(self.referral.release_due(now).await?),
            Job::SampleUptime => JobOutcome::SampleUptime(self.sla.sample(now).await?),
            Job::EvaluateSla => JobOutcome::EvaluateSla {
                credits: self.sla.evaluate(now).await?,
            },
        };
        Ok(outcome)
    }

    /// Start one interval loop per enabled job.
    pub fn spawn(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        Job::ALL
            .into_iter()
            .filter_map(|job| {
                let period = self.config.interval(job.name())?;
                let scheduler = Arc::clone(self);
                info!(job = %job, interval = ?period, "Scheduling job");

                Some(tokio::spawn(async move {
                    let mut ticker = interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        ticker.tick().await;
                        if let Err(e) = scheduler.run_job(job, Utc::now()).await {
                            error!(job = %job, error = %e, "Job run failed");
                        }
                    }
                }))
            })
            .collect()
    }
}
