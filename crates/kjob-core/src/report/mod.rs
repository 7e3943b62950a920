use std::time::Duration;

use kjob_model::{JobName, UnitIndex};

use crate::error::SubmitError;

/// A unit the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub index: UnitIndex,
    pub name: JobName,
}

/// A unit whose submission failed and was given up on.
#[derive(Debug)]
pub struct Abandoned {
    pub index: UnitIndex,
    /// `None` when no valid name could be built for the unit.
    pub name: Option<JobName>,
    pub error: SubmitError,
}

/// Outcome of one dispatch run.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Units requested by the caller.
    pub requested: usize,
    /// Admission decisions taken; one per unit that reached submission.
    pub admissions: usize,
    pub submitted: Vec<Submitted>,
    pub abandoned: Vec<Abandoned>,
    /// `count_active` calls made, successful or not.
    pub observations: usize,
    /// `count_active` calls that failed.
    pub observe_failures: usize,
    /// Run stopped at the gate before every unit was attempted.
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl DispatchReport {
    pub(crate) fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Default::default()
        }
    }

    pub fn submitted_indices(&self) -> Vec<UnitIndex> {
        self.submitted.iter().map(|s| s.index).collect()
    }

    pub fn abandoned_indices(&self) -> Vec<UnitIndex> {
        self.abandoned.iter().map(|a| a.index).collect()
    }

    /// Units never attempted because the run was cancelled.
    pub fn skipped(&self) -> usize {
        self.requested - self.admissions
    }

    /// Every requested unit was attempted exactly once.
    pub fn is_done(&self) -> bool {
        !self.cancelled && self.admissions == self.requested
    }
}
