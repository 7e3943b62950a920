//! The unit of work run inside every job.
//!
//! Reads its [`WorkItem`] from `QUEUE_MESSAGE`, pretends to fetch, process and
//! deliver a file, then exits. A message that cannot be parsed is logged and the
//! unit exits cleanly without doing any work.
//!
//! # Environment variables
//!
//! | Variable                   | Default | Description                                  |
//! |----------------------------|---------|----------------------------------------------|
//! | `QUEUE_MESSAGE`            | --      | JSON work item, at least `{"id": "..."}`     |
//! | `WORKER_RETRIEVE_MAX_SECS` | `5`     | upper bound of the simulated retrieval       |
//! | `WORKER_PROCESS_MAX_SECS`  | `120`   | upper bound of the simulated processing      |
//! | `WORKER_DELIVER_MAX_SECS`  | `5`     | upper bound of the simulated delivery        |
//! | `WORKER_SECRET_VARS`       | empty   | comma-separated secret variables to report   |

use std::time::Duration;

use rand::Rng;

use kjob_model::{PayloadError, WorkItem};

/// Delays never drop below one second unless the configured maximum does.
const MIN_STAGE_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDelay {
    pub min: Duration,
    pub max: Duration,
}

impl StageDelay {
    pub fn up_to(max: Duration) -> Self {
        Self {
            min: MIN_STAGE_DELAY.min(max),
            max,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        if hi <= lo {
            return self.min;
        }
        Duration::from_millis(rng.random_range(lo..=hi))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub retrieve: StageDelay,
    pub process: StageDelay,
    pub deliver: StageDelay,
    /// Variables that may carry secrets; only their presence is reported.
    pub secret_vars: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            retrieve: StageDelay::up_to(Duration::from_secs(5)),
            process: StageDelay::up_to(Duration::from_secs(120)),
            deliver: StageDelay::up_to(Duration::from_secs(5)),
            secret_vars: Vec::new(),
        }
    }
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_secs = |key: &str, default: StageDelay| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| StageDelay::up_to(Duration::from_secs(secs)))
                .unwrap_or(default)
        };
        let defaults = Self::default();

        Self {
            retrieve: max_secs("WORKER_RETRIEVE_MAX_SECS", defaults.retrieve),
            process: max_secs("WORKER_PROCESS_MAX_SECS", defaults.process),
            deliver: max_secs("WORKER_DELIVER_MAX_SECS", defaults.deliver),
            secret_vars: lookup("WORKER_SECRET_VARS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Draw the delays for one run up front.
    pub fn plan<R: Rng + ?Sized>(&self, rng: &mut R) -> Plan {
        Plan {
            retrieve: self.retrieve.sample(rng),
            process: self.process.sample(rng),
            deliver: self.deliver.sample(rng),
        }
    }
}

/// Concrete delays of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub retrieve: Duration,
    pub process: Duration,
    pub deliver: Duration,
}

#[derive(Debug)]
pub enum Outcome {
    Completed { id: String },
    /// The message was unusable; nothing was done.
    Skipped(PayloadError),
}

pub fn parse_message(message: Option<&str>) -> Result<WorkItem, PayloadError> {
    WorkItem::from_message(message.ok_or(PayloadError::Missing)?)
}

/// Which of `vars` are set, without exposing values.
pub fn secret_presence<F>(vars: &[String], lookup: F) -> Vec<(&str, bool)>
where
    F: Fn(&str) -> Option<String>,
{
    vars.iter()
        .map(|v| (v.as_str(), lookup(v).is_some_and(|s| !s.is_empty())))
        .collect()
}

pub async fn run(message: Option<&str>, plan: Plan) -> Outcome {
    let item = match parse_message(message) {
        Ok(item) => item,
        Err(e) => {
            tracing::error!(error = %e, "could not load QUEUE_MESSAGE; nothing to do");
            return Outcome::Skipped(e);
        }
    };
    let id = item.id;

    tracing::info!(%id, "received work item");

    tracing::info!(%id, delay_ms = plan.retrieve.as_millis() as u64, "retrieving file");
    tokio::time::sleep(plan.retrieve).await;

    tracing::info!(%id, delay_ms = plan.process.as_millis() as u64, "processing file");
    tokio::time::sleep(plan.process).await;
    tracing::info!(%id, "finished processing file");

    tracing::info!(%id, delay_ms = plan.deliver.as_millis() as u64, "pushing result");
    tokio::time::sleep(plan.deliver).await;

    tracing::info!(%id, "done");
    Outcome::Completed { id }
}
