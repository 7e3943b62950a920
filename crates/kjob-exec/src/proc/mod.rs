//! Local backend: every job is a child process of the dispatcher.
//!
//! The configured program stands in for the container image; the job's
//! environment (including `QUEUE_MESSAGE`) becomes the child's environment.
//! Children are not killed when the dispatcher exits.

use std::{
    collections::{HashMap, HashSet},
    path::PathBuf,
    process::Stdio,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use tokio::{process::Command, sync::watch, time::Instant};
use tracing::{debug, info, trace, warn};

use kjob_core::{Backend, ObserveError, SubmitError};
use kjob_model::{JobName, JobSpec, JobStatus};

/// Process configuration shared by every job.
#[derive(Clone, Debug)]
pub struct ProcConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Let children write to the dispatcher's stdout/stderr.
    pub inherit_output: bool,
}

impl ProcConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            inherit_output: true,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn quiet(mut self) -> Self {
        self.inherit_output = false;
        self
    }
}

#[derive(Debug)]
struct Finished {
    status: JobStatus,
    /// The name stays taken until then.
    expires: Instant,
}

#[derive(Debug, Default)]
struct ProcState {
    running: HashSet<String>,
    finished: HashMap<String, Finished>,
}

impl ProcState {
    fn purge_expired(&mut self, now: Instant) {
        self.finished.retain(|_, f| f.expires > now);
    }
}

pub struct ProcBackend {
    cfg: ProcConfig,
    state: Arc<Mutex<ProcState>>,
    active: watch::Sender<usize>,
}

impl ProcBackend {
    pub fn new(cfg: ProcConfig) -> Self {
        let (active, _) = watch::channel(0);
        Self {
            cfg,
            state: Arc::new(Mutex::new(ProcState::default())),
            active,
        }
    }

    /// Current status of a job this backend started, if its name is still known.
    pub fn status(&self, name: &JobName) -> Option<JobStatus> {
        let mut state = lock(&self.state);
        state.purge_expired(Instant::now());
        if state.running.contains(name.as_str()) {
            return Some(JobStatus::Running);
        }
        state.finished.get(name.as_str()).map(|f| f.status)
    }

    fn command(&self, spec: &JobSpec) -> Command {
        let mut cmd = Command::new(&self.cfg.program);
        cmd.args(&self.cfg.args);
        for (key, value) in spec.env.resolved() {
            cmd.env(key, value);
        }
        for secret in &spec.secrets {
            match std::env::var(&secret.env) {
                Ok(value) => {
                    cmd.env(&secret.env, value);
                }
                Err(_) => trace!(env = %secret.env, "secret not present; leaving unset"),
            }
        }

        let output = || {
            if self.cfg.inherit_output {
                Stdio::inherit()
            } else {
                Stdio::null()
            }
        };
        cmd.stdin(Stdio::null()).stdout(output()).stderr(output());
        cmd
    }
}

#[async_trait]
impl Backend for ProcBackend {
    fn name(&self) -> &'static str {
        "proc"
    }

    async fn submit(&self, spec: &JobSpec) -> Result<(), SubmitError> {
        let name = spec.name.to_string();
        if spec.policy.backoff_limit > 0 {
            warn!(job = %name, "process backend never retries; ignoring backoff limit");
        }

        let mut child = {
            let mut state = lock(&self.state);
            state.purge_expired(Instant::now());
            if state.running.contains(&name) || state.finished.contains_key(&name) {
                return Err(SubmitError::Conflict { name });
            }

            let child = self.command(spec).spawn().map_err(|e| {
                SubmitError::Rejected(format!("spawn {}: {e}", self.cfg.program.display()))
            })?;
            state.running.insert(name.clone());
            self.active.send_replace(state.running.len());
            child
        };

        debug!(job = %name, pid = child.id(), "process started");

        let state = Arc::clone(&self.state);
        let active = self.active.clone();
        let ttl = Duration::from_secs(u64::from(spec.policy.ttl_seconds_after_finished));
        tokio::spawn(async move {
            let status = match child.wait().await {
                Ok(exit) if exit.success() => JobStatus::Succeeded,
                Ok(exit) => {
                    info!(job = %name, code = ?exit.code(), "process failed");
                    JobStatus::Failed
                }
                Err(e) => {
                    warn!(job = %name, error = %e, "lost track of process");
                    JobStatus::Failed
                }
            };

            let mut state = lock(&state);
            state.running.remove(&name);
            state.finished.insert(
                name.clone(),
                Finished {
                    status,
                    expires: Instant::now() + ttl,
                },
            );
            active.send_replace(state.running.len());
            debug!(job = %name, ?status, "process finished");
        });

        Ok(())
    }

    async fn count_active(&self) -> Result<usize, ObserveError> {
        Ok(lock(&self.state).running.len())
    }

    fn watch_active(&self) -> Option<watch::Receiver<usize>> {
        Some(self.active.subscribe())
    }
}

fn lock(state: &Mutex<ProcState>) -> MutexGuard<'_, ProcState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
