use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, de};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Identifies one attempt of one workflow run on one server.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RunIdentity {
    pub owner: String,
    pub repo: String,
    pub run_id: u64,
    pub run_attempt: u64,
    pub server_url: String,
}

impl RunIdentity {
    pub fn repo_url(&self) -> String { format!("{}/{}/{}", self.server_url, self.owner, self.repo) }

    pub fn run_url(&self) -> String { format!("{}/actions/runs/{}", self.repo_url(), self.run_id) }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} run {} attempt {}", self.owner, self.repo, self.run_id, self.run_attempt)
    }
}

/// An RFC 3339 timestamp as sent by the platform. The original text is kept
/// so it can be published unchanged.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Timestamp {
    raw: String,
    value: OffsetDateTime,
}

impl Timestamp {
    pub fn as_str(&self) -> &str { &self.raw }

    pub fn value(&self) -> OffsetDateTime { self.value }
}

impl FromStr for Timestamp {
    type Err = time::error::Parse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { raw: s.to_string(), value: OffsetDateTime::parse(s, &Rfc3339)? })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.raw) }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct WorkflowRunMetadata {
    pub name: Option<String>,
    pub path: Option<String>,
    pub run_number: u64,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct JobRecord {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub conclusion: Option<String>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub head_sha: String,
}

/// A check-run attached to a commit. `external_id` holds the job ID for
/// check-runs created by Actions jobs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CheckRunRecord {
    pub id: u64,
    pub external_id: Option<String>,
    pub summary: Option<String>,
}

/// Everything published for the resolved job. Built once, never mutated.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ResolvedJobInfo {
    pub run_url: String,
    pub job_id: u64,
    pub job_name: String,
    pub job_url: String,
    pub job_summary_url: String,
    pub job_summary_raw_url: String,
    pub job_status: String,
    pub job_conclusion: Option<String>,
    pub job_started_at: Option<Timestamp>,
    pub job_completed_at: Option<Timestamp>,
    pub workflow_name: String,
    pub workflow_path: String,
    pub run_number: u64,
    pub job_summary_content: Option<String>,
}

impl ResolvedJobInfo {
    pub const OUTPUT_NAMES: [&'static str; 14] = [
        "run_url",
        "job_id",
        "job_name",
        "job_url",
        "job_summary_url",
        "job_summary_raw_url",
        "job_status",
        "job_conclusion",
        "job_started_at",
        "job_completed_at",
        "workflow_name",
        "workflow_path",
        "run_number",
        "job_summary_content",
    ];

    /// Flatten into `(name, value)` output pairs. Absent values become empty strings.
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        let values = [
            self.run_url.clone(),
            self.job_id.to_string(),
            self.job_name.clone(),
            self.job_url.clone(),
            self.job_summary_url.clone(),
            self.job_summary_raw_url.clone(),
            self.job_status.clone(),
            self.job_conclusion.clone().unwrap_or_default(),
            format_timestamp(self.job_started_at.as_ref()),
            format_timestamp(self.job_completed_at.as_ref()),
            self.workflow_name.clone(),
            self.workflow_path.clone(),
            self.run_number.to_string(),
            self.job_summary_content.clone().unwrap_or_default(),
        ];
        Self::OUTPUT_NAMES.into_iter().zip(values).collect()
    }
}

fn format_timestamp(value: Option<&Timestamp>) -> String {
    value.map(|ts| ts.as_str().to_string()).unwrap_or_default()
}
