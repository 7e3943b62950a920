use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use kjob_core::{Backend, ObserveError, SubmitError};
use kjob_model::{JobSpec, UnitIndex};

/// Everything the fake backend saw, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Observed(usize),
    ObserveFailed,
    Submitted(UnitIndex),
    SubmitFailed(UnitIndex),
}

/// Backend that answers `count_active` from a script.
///
/// Once the script runs out every observation returns `fallback`
/// (`None` meaning an observation failure).
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Option<usize>>>,
    fallback: Option<usize>,
    failing: HashSet<UnitIndex>,
    first_observe_delay: Mutex<Option<Duration>>,
    watch: Option<watch::Receiver<usize>>,
    calls: Mutex<Vec<Call>>,
    specs: Mutex<Vec<JobSpec>>,
}

impl ScriptedBackend {
    pub fn new(script: impl IntoIterator<Item = Option<usize>>, fallback: Option<usize>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            failing: HashSet::new(),
            first_observe_delay: Mutex::new(None),
            watch: None,
            calls: Mutex::new(Vec::new()),
            specs: Mutex::new(Vec::new()),
        }
    }

    /// Always reports `active` jobs.
    pub fn constant(active: usize) -> Self {
        Self::new([], Some(active))
    }

    /// Observation always fails.
    pub fn blind() -> Self {
        Self::new([], None)
    }

    pub fn failing_submit(mut self, index: UnitIndex) -> Self {
        self.failing.insert(index);
        self
    }

    pub fn slow_first_observe(self, delay: Duration) -> Self {
        *self.first_observe_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn with_watch(mut self, rx: watch::Receiver<usize>) -> Self {
        self.watch = Some(rx);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn specs(&self) -> Vec<JobSpec> {
        self.specs.lock().unwrap().clone()
    }

    pub fn submit_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Submitted(_) | Call::SubmitFailed(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn submit(&self, spec: &JobSpec) -> Result<(), SubmitError> {
        self.specs.lock().unwrap().push(spec.clone());
        if self.failing.contains(&spec.index) {
            self.record(Call::SubmitFailed(spec.index));
            return Err(SubmitError::Conflict {
                name: spec.name.to_string(),
            });
        }
        self.record(Call::Submitted(spec.index));
        Ok(())
    }

    async fn count_active(&self) -> Result<usize, ObserveError> {
        let delay = self.first_observe_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        match next {
            Some(active) => {
                self.record(Call::Observed(active));
                Ok(active)
            }
            None => {
                self.record(Call::ObserveFailed);
                Err(ObserveError::Transport("connection refused".into()))
            }
        }
    }

    fn watch_active(&self) -> Option<watch::Receiver<usize>> {
        self.watch.clone()
    }
}
