mod gate;

use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use kjob_model::{JobName, JobSpec, JobTemplate, UnitIndex};

use crate::{
    backend::Backend,
    config::DispatchConfig,
    error::{CoreError, SubmitError},
    report::{Abandoned, DispatchReport, Submitted},
};
use gate::{Admission, Gate};

/// Submits one job per unit index while keeping the active count under a ceiling.
///
/// The loop is strictly sequential: unit `i + 1` is not looked at until unit `i`
/// has been submitted or abandoned. It never waits for a submitted job to finish,
/// only for the backend to report room below the ceiling.
pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    template: JobTemplate,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        backend: Arc<dyn Backend>,
        template: JobTemplate,
        config: DispatchConfig,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            backend,
            template,
            config,
        })
    }

    /// Dispatch units `0..count`.
    ///
    /// Returns once every unit was submitted or abandoned, or as soon as `cancel`
    /// fires while waiting for admission. Jobs already submitted keep running either way.
    #[instrument(
        level = "info",
        skip(self, cancel),
        fields(backend = self.backend.name(), ceiling = self.config.ceiling)
    )]
    pub async fn run(&self, count: usize, cancel: CancellationToken) -> DispatchReport {
        let started = Instant::now();
        let mut report = DispatchReport::new(count);
        let mut gate = Gate::new(
            self.backend.as_ref(),
            self.config.ceiling,
            self.config.poll_interval,
            self.config.call_timeout,
        );

        info!(
            count,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "dispatch run started"
        );

        for index in 0..count {
            let active = match gate.admit(&cancel).await {
                Admission::Admitted { active } => active,
                Admission::Cancelled => {
                    warn!(index, remaining = count - index, "dispatch cancelled");
                    report.cancelled = true;
                    break;
                }
            };
            report.admissions += 1;

            match self.submit(index).await {
                Ok(name) => {
                    info!(index, job = %name, active, "job submitted");
                    report.submitted.push(Submitted { index, name });
                }
                Err((name, e)) => {
                    error!(
                        index,
                        job = name.as_ref().map(JobName::as_str).unwrap_or("<invalid>"),
                        error = %e,
                        "job submission failed; abandoning unit"
                    );
                    report.abandoned.push(Abandoned {
                        index,
                        name,
                        error: e,
                    });
                }
            }
        }

        report.observations = gate.observations;
        report.observe_failures = gate.failures;
        report.elapsed = started.elapsed();

        info!(
            submitted = report.submitted.len(),
            abandoned = report.abandoned.len(),
            skipped = report.skipped(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "dispatch run finished"
        );
        report
    }

    async fn submit(&self, index: UnitIndex) -> Result<JobName, (Option<JobName>, SubmitError)> {
        let spec: JobSpec = self
            .template
            .build(index)
            .map_err(|e| (None, SubmitError::from(e)))?;
        let name = spec.name.clone();

        let result = match self.config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, self.backend.submit(&spec))
                .await
                .unwrap_or(Err(SubmitError::Timeout(limit))),
            None => self.backend.submit(&spec).await,
        };

        match result {
            Ok(()) => Ok(name),
            Err(e) => Err((Some(name), e)),
        }
    }
}
