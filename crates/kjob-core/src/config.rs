use std::time::Duration;

use crate::error::CoreError;

/// Maximum number of simultaneously active jobs.
pub const DEFAULT_CEILING: usize = 10;

/// Time between admission re-checks while the ceiling is reached.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub ceiling: usize,
    pub poll_interval: Duration,
    /// Upper bound for each backend call; `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
            poll_interval: DEFAULT_POLL_INTERVAL,
            call_timeout: None,
        }
    }
}

impl DispatchConfig {
    pub fn with_ceiling(mut self, ceiling: usize) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = Some(call_timeout);
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ceiling == 0 {
            return Err(CoreError::InvalidConfig(
                "ceiling must be at least 1; nothing would ever be admitted".into(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(CoreError::InvalidConfig(
                "poll interval must be greater than zero".into(),
            ));
        }
        if self.call_timeout.is_some_and(|t| t.is_zero()) {
            return Err(CoreError::InvalidConfig(
                "call timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
