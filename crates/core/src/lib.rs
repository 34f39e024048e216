pub mod config;
pub mod models;
pub mod resolve;

use thiserror::Error;

use crate::{
    config::Settings,
    models::{CheckRunRecord, JobRecord, ResolvedJobInfo, RunIdentity, WorkflowRunMetadata},
    resolve::{DeriveOptions, derive_job_info, find_job},
};

#[derive(Error, Debug)]
pub enum JobInfoError {
    #[error("{0}")]
    InvalidInput(String),
    #[error(transparent)]
    Remote(#[from] anyhow::Error),
    #[error("Job \"{job}\" not found in workflow run {run_id}")]
    JobNotFound { job: String, run_id: u64 },
}

/// Read access to workflow runs, jobs and check-runs on the CI platform.
pub trait JobSource {
    fn workflow_run(
        &self,
        identity: &RunIdentity,
    ) -> impl Future<Output = anyhow::Result<WorkflowRunMetadata>> + Send;

    /// Jobs for the identified run attempt, in platform order.
    fn jobs(
        &self,
        identity: &RunIdentity,
    ) -> impl Future<Output = anyhow::Result<Vec<JobRecord>>> + Send;

    /// Check-runs for a commit SHA, branch or tag name.
    fn check_runs(
        &self,
        identity: &RunIdentity,
        git_ref: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<CheckRunRecord>>> + Send;
}

/// Fetch the run and its jobs, pick the requested job and derive its outputs.
///
/// Calls are issued strictly in sequence and any failure aborts the whole
/// resolution; there is no retry and no partial result.
pub async fn resolve_job_info<S: JobSource>(
    source: &S,
    settings: &Settings,
) -> Result<ResolvedJobInfo, JobInfoError> {
    let identity = &settings.identity;
    tracing::debug!(
        "Getting job info for {}/{} run {} job {}",
        identity.owner,
        identity.repo,
        identity.run_id,
        settings.job
    );

    let run = source.workflow_run(identity).await?;
    let jobs = source.jobs(identity).await?;
    tracing::debug!("{} (jobs {})", identity, jobs.len());

    let job = find_job(&jobs, &settings.job, identity.run_id)?;
    if let (Some(started), Some(completed)) = (&job.started_at, &job.completed_at) {
        let elapsed = completed.value() - started.value();
        tracing::debug!("Job {} ({}) ran for {}s", job.id, job.status, elapsed.whole_seconds());
    }
    let check_runs = if settings.include_job_summary_content {
        let check_runs = source.check_runs(identity, &job.head_sha).await?;
        tracing::debug!("Commit {} (check runs {})", job.head_sha, check_runs.len());
        Some(check_runs)
    } else {
        None
    };

    let info = derive_job_info(identity, &run, job, check_runs.as_deref(), &DeriveOptions {
        fallback_workflow: &settings.workflow,
        include_job_summary_anchor: settings.include_job_summary_anchor,
    });
    tracing::info!("Job Summary URL: {}", info.job_summary_url);
    Ok(info)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use anyhow::anyhow;
    use url::Url;

    use super::*;

    #[derive(Default)]
    struct MockSource {
        run: Option<WorkflowRunMetadata>,
        jobs: Vec<JobRecord>,
        check_runs: Vec<CheckRunRecord>,
        fail_run: Option<&'static str>,
        fail_jobs: Option<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl MockSource {
        fn record(&self, call: String) { self.calls.lock().unwrap().push(call); }

        fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }
    }

    impl JobSource for MockSource {
        async fn workflow_run(
            &self,
            identity: &RunIdentity,
        ) -> anyhow::Result<WorkflowRunMetadata> {
            self.record(format!("workflow_run {}", identity.run_id));
            match self.fail_run {
                Some(message) => Err(anyhow!(message)),
                None => Ok(self.run.clone().unwrap_or_default()),
            }
        }

        async fn jobs(&self, identity: &RunIdentity) -> anyhow::Result<Vec<JobRecord>> {
            self.record(format!("jobs {} {}", identity.run_id, identity.run_attempt));
            match self.fail_jobs {
                Some(message) => Err(anyhow!(message)),
                None => Ok(self.jobs.clone()),
            }
        }

        async fn check_runs(
            &self,
            _identity: &RunIdentity,
            git_ref: &str,
        ) -> anyhow::Result<Vec<CheckRunRecord>> {
            self.record(format!("check_runs {git_ref}"));
            Ok(self.check_runs.clone())
        }
    }

    fn settings() -> Settings {
        Settings {
            identity: RunIdentity {
                owner: "owner".to_string(),
                repo: "repo".to_string(),
                run_id: 12345,
                run_attempt: 1,
                server_url: "https://github.com".to_string(),
            },
            workflow: "CI".to_string(),
            job: "build".to_string(),
            token: "test-token".to_string(),
            api_url: Url::parse("https://api.github.com").unwrap(),
            include_job_summary_anchor: false,
            include_job_summary_content: false,
        }
    }

    fn source() -> MockSource {
        MockSource {
            run: Some(WorkflowRunMetadata {
                name: Some("CI Workflow".to_string()),
                path: Some(".github/workflows/ci.yml".to_string()),
                run_number: 42,
            }),
            jobs: vec![JobRecord {
                id: 54321,
                name: "build".to_string(),
                status: "completed".to_string(),
                conclusion: Some("success".to_string()),
                started_at: Some("2024-01-01T00:00:00Z".parse().unwrap()),
                completed_at: Some("2024-01-01T00:05:00Z".parse().unwrap()),
                head_sha: "abc123".to_string(),
            }],
            check_runs: vec![CheckRunRecord {
                id: 99999,
                external_id: Some("54321".to_string()),
                summary: Some("## Test Summary".to_string()),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_resolves_job_and_sets_outputs() {
        let source = source();
        let info = resolve_job_info(&source, &settings()).await.unwrap();
        let outputs = info.outputs();
        let get = |key: &str| outputs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str());
        assert_eq!(get("run_url"), Some("https://github.com/owner/repo/actions/runs/12345"));
        assert_eq!(get("job_id"), Some("54321"));
        assert_eq!(get("job_name"), Some("build"));
        assert_eq!(
            get("job_url"),
            Some("https://github.com/owner/repo/actions/runs/12345/job/54321")
        );
        assert_eq!(get("job_summary_url"), get("run_url"));
        assert_eq!(get("job_status"), Some("completed"));
        assert_eq!(get("job_conclusion"), Some("success"));
        assert_eq!(get("job_started_at"), Some("2024-01-01T00:00:00Z"));
        assert_eq!(get("job_completed_at"), Some("2024-01-01T00:05:00Z"));
        assert_eq!(get("workflow_name"), Some("CI Workflow"));
        assert_eq!(get("run_number"), Some("42"));
        assert_eq!(get("job_summary_content"), Some(""));
        // No check-run lookup unless summary content is requested
        assert_eq!(source.calls(), ["workflow_run 12345", "jobs 12345 1"]);
    }

    #[tokio::test]
    async fn test_summary_anchor() {
        let settings = Settings { include_job_summary_anchor: true, ..settings() };
        let info = resolve_job_info(&source(), &settings).await.unwrap();
        assert_eq!(
            info.job_summary_url,
            "https://github.com/owner/repo/actions/runs/12345#summary-54321"
        );
    }

    #[tokio::test]
    async fn test_summary_content_from_check_run() {
        let settings = Settings { include_job_summary_content: true, ..settings() };
        let source = source();
        let info = resolve_job_info(&source, &settings).await.unwrap();
        assert_eq!(info.job_summary_content.as_deref(), Some("## Test Summary"));
        assert_eq!(source.calls(), ["workflow_run 12345", "jobs 12345 1", "check_runs abc123"]);

        let source = MockSource { check_runs: vec![], ..self::source() };
        let info = resolve_job_info(&source, &settings).await.unwrap();
        assert_eq!(info.job_summary_content.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_job_not_found() {
        let settings = Settings { include_job_summary_content: true, ..settings() };
        let source = MockSource { jobs: vec![], ..source() };
        let err = resolve_job_info(&source, &settings).await.unwrap_err();
        assert!(matches!(err, JobInfoError::JobNotFound { .. }));
        assert_eq!(err.to_string(), "Job \"build\" not found in workflow run 12345");
        assert_eq!(source.calls(), ["workflow_run 12345", "jobs 12345 1"]);
    }

    #[tokio::test]
    async fn test_remote_error_message_is_preserved() {
        let source = MockSource { fail_run: Some("API Error"), ..source() };
        let err = resolve_job_info(&source, &settings()).await.unwrap_err();
        assert!(matches!(err, JobInfoError::Remote(_)));
        assert_eq!(err.to_string(), "API Error");
        assert_eq!(source.calls(), ["workflow_run 12345"]);

        let source = MockSource { fail_jobs: Some("Bad credentials"), ..self::source() };
        let err = resolve_job_info(&source, &settings()).await.unwrap_err();
        assert_eq!(err.to_string(), "Bad credentials");
    }
}
