//! `kjob-dispatch`: submit N batch jobs while keeping at most `--ceiling` active.

mod args;
mod backend;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use kjob_core::Dispatcher;
use kjob_observe::init_logger;

use crate::args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logger(&args.logger_config())?;

    let backend = backend::build(&args)?;
    let dispatcher = Dispatcher::new(backend, args.template(), args.dispatch_config())?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let report = dispatcher.run(args.num_jobs, cancel).await;

    if report.is_done() && report.abandoned.is_empty() {
        info!(submitted = report.submitted.len(), "all units dispatched");
    } else {
        warn!(
            submitted = report.submitted.len(),
            abandoned = ?report.abandoned_indices(),
            skipped = report.skipped(),
            "dispatch finished with units not submitted"
        );
    }
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupt received; no further units will be admitted");
        cancel.cancel();
    }
}
