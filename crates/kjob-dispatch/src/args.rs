use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};

use kjob_core::{
    DispatchConfig,
    config::{DEFAULT_CEILING, DEFAULT_POLL_INTERVAL},
};
use kjob_model::{
    DEFAULT_CONTAINER_NAME, DEFAULT_IMAGE, DEFAULT_JOB_PREFIX, JobTemplate, SecretRef,
};
use kjob_observe::{LoggerConfig, LoggerFormat, LoggerLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Kubernetes batch/v1 Jobs.
    Kube,
    /// Local child processes.
    Proc,
}

/// Submit N batch jobs without exceeding a ceiling of concurrently active jobs.
#[derive(Debug, Parser)]
#[command(name = "kjob-dispatch", version)]
pub struct Args {
    /// Number of units of work to dispatch.
    #[arg(long, short = 'n', value_name = "N")]
    pub num_jobs: usize,

    /// Maximum number of active jobs.
    #[arg(long, env = "KJOB_CEILING", default_value_t = DEFAULT_CEILING)]
    pub ceiling: usize,

    /// Seconds between observations while at the ceiling.
    #[arg(
        long,
        env = "KJOB_POLL_INTERVAL",
        value_name = "SECS",
        default_value_t = DEFAULT_POLL_INTERVAL.as_secs()
    )]
    pub poll_interval: u64,

    /// Upper bound in seconds for a single backend call.
    #[arg(long, env = "KJOB_CALL_TIMEOUT", value_name = "SECS")]
    pub call_timeout: Option<u64>,

    #[arg(long, value_enum, env = "KJOB_BACKEND", default_value_t = BackendKind::Kube)]
    pub backend: BackendKind,

    #[arg(long, env = "KJOB_IMAGE", default_value = DEFAULT_IMAGE)]
    pub image: String,

    /// Job names are `{prefix}-{index}`.
    #[arg(long, env = "KJOB_PREFIX", default_value = DEFAULT_JOB_PREFIX)]
    pub prefix: String,

    #[arg(long, env = "KJOB_CONTAINER", default_value = DEFAULT_CONTAINER_NAME)]
    pub container: String,

    /// Program run per job by the proc backend.
    #[arg(long, env = "KJOB_WORKER_PROGRAM", required_if_eq("backend", "proc"))]
    pub worker_program: Option<PathBuf>,

    /// Extra argument for the worker program; repeatable.
    #[arg(long = "worker-arg", value_name = "ARG")]
    pub worker_args: Vec<String>,

    /// Optional secret exposed to every job, as `ENV=secret/key`; repeatable.
    #[arg(long = "secret", value_name = "ENV=SECRET/KEY", value_parser = parse_secret)]
    pub secrets: Vec<SecretRef>,

    #[arg(long, env = "KJOB_LOG_FORMAT", default_value = "text")]
    pub log_format: LoggerFormat,

    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    #[arg(long, env = "KJOB_LOG_LEVEL", default_value = "info")]
    pub log_level: LoggerLevel,
}

fn parse_secret(s: &str) -> Result<SecretRef, String> {
    SecretRef::parse(s).ok_or_else(|| format!("expected ENV=secret/key, got `{s}`"))
}

impl Args {
    pub fn dispatch_config(&self) -> DispatchConfig {
        let cfg = DispatchConfig::default()
            .with_ceiling(self.ceiling)
            .with_poll_interval(Duration::from_secs(self.poll_interval));
        match self.call_timeout {
            Some(secs) => cfg.with_call_timeout(Duration::from_secs(secs)),
            None => cfg,
        }
    }

    pub fn template(&self) -> JobTemplate {
        self.secrets.iter().cloned().fold(
            JobTemplate::new(&self.image)
                .with_prefix(&self.prefix)
                .with_container(&self.container),
            JobTemplate::with_secret,
        )
    }

    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            format: self.log_format,
            level: self.log_level.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("kjob-dispatch").chain(args.iter().copied()))
    }

    #[test]
    fn num_jobs_is_required() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn explicit_flags_reach_config_and_template() {
        let args = parse(&[
            "--num-jobs",
            "12",
            "--ceiling",
            "3",
            "--poll-interval",
            "1",
            "--call-timeout",
            "20",
            "--image",
            "registry.local/etl:2",
            "--prefix",
            "etl",
            "--secret",
            "API_TOKEN=etl-creds/token",
            "--secret",
            "DB_PASSWORD=etl-creds/db",
        ])
        .unwrap();

        assert_eq!(args.num_jobs, 12);
        let cfg = args.dispatch_config();
        assert_eq!(cfg.ceiling, 3);
        assert_eq!(cfg.poll_interval, Duration::from_secs(1));
        assert_eq!(cfg.call_timeout, Some(Duration::from_secs(20)));

        let spec = args.template().build(4).unwrap();
        assert_eq!(spec.name.as_str(), "etl-4");
        assert_eq!(spec.image, "registry.local/etl:2");
        assert_eq!(spec.secrets.len(), 2);
        assert_eq!(spec.secrets[1].env, "DB_PASSWORD");
    }

    #[test]
    fn malformed_secret_is_rejected() {
        assert!(parse(&["-n", "1", "--secret", "API_TOKEN"]).is_err());
        assert!(parse(&["-n", "1", "--secret", "API_TOKEN=creds"]).is_err());
    }

    #[test]
    fn proc_backend_needs_a_program() {
        assert!(parse(&["-n", "1", "--backend", "proc"]).is_err());

        let args = parse(&[
            "-n",
            "1",
            "--backend",
            "proc",
            "--worker-program",
            "/usr/local/bin/kjob-worker",
        ])
        .unwrap();
        assert_eq!(args.backend, BackendKind::Proc);
    }

    #[test]
    fn bad_log_settings_are_rejected() {
        assert!(parse(&["-n", "1", "--log-format", "xml"]).is_err());
        assert!(parse(&["-n", "1", "--log-level", "kjob_core=loudest"]).is_err());
    }
}
