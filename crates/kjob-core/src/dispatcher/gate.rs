use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{backend::Backend, error::ObserveError};

/// Result of waiting at the gate for one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// The last observation was below the ceiling.
    Admitted { active: usize },
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Elapsed,
    Changed,
    Closed,
    Cancelled,
}

/// A unit may be submitted only while strictly fewer than `ceiling` jobs are active.
#[inline]
pub(crate) fn admits(active: usize, ceiling: usize) -> bool {
    active < ceiling
}

/// Admission gate for one dispatch run.
pub(crate) struct Gate<'a> {
    backend: &'a dyn Backend,
    ceiling: usize,
    poll_interval: Duration,
    call_timeout: Option<Duration>,
    watch: Option<watch::Receiver<usize>>,
    pub(crate) observations: usize,
    pub(crate) failures: usize,
}

impl<'a> Gate<'a> {
    pub(crate) fn new(
        backend: &'a dyn Backend,
        ceiling: usize,
        poll_interval: Duration,
        call_timeout: Option<Duration>,
    ) -> Self {
        Self {
            watch: backend.watch_active(),
            backend,
            ceiling,
            poll_interval,
            call_timeout,
            observations: 0,
            failures: 0,
        }
    }

    /// Block until the backend reports room for one more job, or until cancelled.
    ///
    /// Every admission is backed by a fresh observation; a failed observation
    /// never admits.
    pub(crate) async fn admit(&mut self, cancel: &CancellationToken) -> Admission {
        loop {
            if cancel.is_cancelled() {
                return Admission::Cancelled;
            }

            self.observations += 1;
            match self.observe().await {
                Ok(active) if admits(active, self.ceiling) => {
                    debug!(active, ceiling = self.ceiling, "admitted");
                    return Admission::Admitted { active };
                }
                Ok(active) => {
                    debug!(
                        active,
                        ceiling = self.ceiling,
                        wait_ms = self.poll_interval.as_millis() as u64,
                        "too many active jobs; waiting"
                    );
                }
                Err(e) => {
                    self.failures += 1;
                    warn!(error = %e, "failed to count active jobs; not admitting");
                }
            }

            if self.wait(cancel).await == Wake::Cancelled {
                return Admission::Cancelled;
            }
        }
    }

    async fn observe(&self) -> Result<usize, ObserveError> {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.backend.count_active())
                .await
                .map_err(|_| ObserveError::Timeout(limit))?,
            None => self.backend.count_active().await,
        }
    }

    /// Sleep one poll interval; a change notification from the backend ends it early.
    async fn wait(&mut self, cancel: &CancellationToken) -> Wake {
        let sleep = tokio::time::sleep(self.poll_interval);

        let woke = match self.watch.as_mut() {
            Some(rx) => tokio::select! {
                biased;
                _ = cancel.cancelled() => Wake::Cancelled,
                changed = rx.changed() => if changed.is_ok() { Wake::Changed } else { Wake::Closed },
                _ = sleep => Wake::Elapsed,
            },
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => Wake::Cancelled,
                _ = sleep => Wake::Elapsed,
            },
        };

        if woke == Wake::Closed {
            debug!("backend closed its active-count watch; falling back to polling");
            self.watch = None;
        }
        trace!(?woke, "gate woke up");
        woke
    }
}

#[cfg(test)]
mod tests {
    use super::admits;

    #[test]
    fn admits_strictly_below_ceiling() {
        assert!(admits(0, 1));
        assert!(admits(1, 2));
        assert!(!admits(2, 2));
        assert!(!admits(3, 2));
    }
}
