//! `kjob-worker`: payload program executed once per job.

use kjob_model::QUEUE_MESSAGE_ENV;
use kjob_observe::{LoggerConfig, init_logger};
use kjob_worker::{Outcome, WorkerConfig, run, secret_presence};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logger(&LoggerConfig::default())?;

    let cfg = WorkerConfig::from_env();
    for (var, present) in secret_presence(&cfg.secret_vars, |k| std::env::var(k).ok()) {
        if present {
            tracing::info!(var, "secret available");
        } else {
            tracing::info!(var, "secret not provided");
        }
    }

    let plan = cfg.plan(&mut rand::rng());
    let message = std::env::var(QUEUE_MESSAGE_ENV).ok();

    // A skipped unit still exits 0: the job itself did nothing wrong.
    match run(message.as_deref(), plan).await {
        Outcome::Completed { id } => tracing::debug!(%id, "worker exiting"),
        Outcome::Skipped(_) => tracing::debug!("worker exiting without work"),
    }
    Ok(())
}
