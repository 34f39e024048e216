//! Wire shapes of the REST responses, limited to the fields we read.

use job_info_core::models::{CheckRunRecord, JobRecord, Timestamp, WorkflowRunMetadata};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WorkflowRun {
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    pub run_number: u64,
}

impl From<WorkflowRun> for WorkflowRunMetadata {
    fn from(value: WorkflowRun) -> Self {
        Self { name: value.name, path: value.path, run_number: value.run_number }
    }
}

#[derive(Debug, Deserialize)]
pub struct JobList {
    pub total_count: u64,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Deserialize)]
pub struct Job {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub conclusion: Option<String>,
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
    pub head_sha: String,
}

impl From<Job> for JobRecord {
    fn from(value: Job) -> Self {
        Self {
            id: value.id,
            name: value.name,
            status: value.status,
            conclusion: value.conclusion,
            started_at: value.started_at,
            completed_at: value.completed_at,
            head_sha: value.head_sha,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckRunList {
    pub check_runs: Vec<CheckRun>,
}

#[derive(Debug, Deserialize)]
pub struct CheckRun {
    pub id: u64,
    pub external_id: Option<String>,
    pub output: Option<CheckRunOutput>,
}

#[derive(Debug, Deserialize)]
pub struct CheckRunOutput {
    pub summary: Option<String>,
}

impl From<CheckRun> for CheckRunRecord {
    fn from(value: CheckRun) -> Self {
        Self {
            id: value.id,
            external_id: value.external_id,
            summary: value.output.and_then(|o| o.summary),
        }
    }
}
