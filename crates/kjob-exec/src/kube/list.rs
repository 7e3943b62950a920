//! Decoding of `batch/v1` `JobList` responses.

use serde::Deserialize;

use kjob_model::JobStatus;

#[derive(Debug, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub items: Vec<JobItem>,
}

#[derive(Debug, Deserialize)]
pub struct JobItem {
    #[serde(default)]
    pub metadata: ItemMeta,
    #[serde(default)]
    pub status: Option<ItemStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemMeta {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemStatus {
    #[serde(default)]
    pub active: Option<u32>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
}

impl JobItem {
    /// Status of the job as the dispatcher sees it.
    ///
    /// A job without a terminal condition is pending or running, even before
    /// the controller has created its pod.
    pub fn job_status(&self) -> JobStatus {
        let Some(status) = &self.status else {
            return JobStatus::Pending;
        };
        let terminal = status
            .conditions
            .iter()
            .filter(|c| c.status == "True")
            .find_map(|c| match c.kind.as_str() {
                "Complete" => Some(JobStatus::Succeeded),
                "Failed" => Some(JobStatus::Failed),
                _ => None,
            });

        match terminal {
            Some(done) => done,
            None if status.active.unwrap_or(0) > 0 => JobStatus::Running,
            None => JobStatus::Pending,
        }
    }
}

impl JobList {
    pub fn count_active(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.job_status().is_active())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = r#"{
        "kind": "JobList",
        "apiVersion": "batch/v1",
        "metadata": {"resourceVersion": "42"},
        "items": [
            {"metadata": {"name": "job-0"}, "status": {"active": 1}},
            {"metadata": {"name": "job-1"}, "status": {}},
            {"metadata": {"name": "job-2"}},
            {"metadata": {"name": "job-3"}, "status": {"succeeded": 1,
                "conditions": [{"type": "Complete", "status": "True"}]}},
            {"metadata": {"name": "job-4"}, "status": {"failed": 1,
                "conditions": [{"type": "Failed", "status": "True", "reason": "BackoffLimitExceeded"}]}},
            {"metadata": {"name": "job-5"}, "status": {"active": 1,
                "conditions": [{"type": "Suspended", "status": "False"}]}}
        ]
    }"#;

    #[test]
    fn classifies_items() {
        let list: JobList = serde_json::from_str(LIST).unwrap();
        let statuses: Vec<_> = list.items.iter().map(JobItem::job_status).collect();
        assert_eq!(
            statuses,
            vec![
                JobStatus::Running,
                JobStatus::Pending,
                JobStatus::Pending,
                JobStatus::Succeeded,
                JobStatus::Failed,
                JobStatus::Running,
            ]
        );
    }

    #[test]
    fn counts_pending_and_running() {
        let list: JobList = serde_json::from_str(LIST).unwrap();
        assert_eq!(list.count_active(), 4);
    }

    #[test]
    fn empty_list() {
        let list: JobList = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(list.count_active(), 0);

        let list: JobList = serde_json::from_str(r#"{"kind": "JobList"}"#).unwrap();
        assert_eq!(list.count_active(), 0);
    }
}
