use async_trait::async_trait;
use tokio::sync::watch;

use kjob_model::JobSpec;

use crate::error::{ObserveError, SubmitError};

/// Execution backend the dispatcher submits jobs to.
///
/// Submission and observation are separate calls that fail independently.
/// Nothing makes "count, then submit" atomic; a backend must not pretend otherwise.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Ask the backend to start the unit described by `spec`.
    ///
    /// A name that already exists must fail with [`SubmitError::Conflict`].
    /// Implementations do not retry.
    async fn submit(&self, spec: &JobSpec) -> Result<(), SubmitError>;

    /// Number of jobs created by this dispatcher that are pending or running.
    async fn count_active(&self) -> Result<usize, ObserveError>;

    /// Change notifications for the active count, if the backend can push them.
    ///
    /// The dispatcher still calls [`Backend::count_active`] before every
    /// admission; a notification only ends the wait early.
    fn watch_active(&self) -> Option<watch::Receiver<usize>> {
        None
    }
}
