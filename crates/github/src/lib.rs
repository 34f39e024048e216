mod models;

use anyhow::{Context, Result};
use job_info_core::{
    JobSource,
    config::Settings,
    models::{CheckRunRecord, JobRecord, RunIdentity, WorkflowRunMetadata},
};
use octocrab::{Octocrab, service::middleware::retry::RetryConfig};

use crate::models::{CheckRunList, JobList, WorkflowRun};

/// GitHub REST client used to look up runs, jobs and check-runs.
#[derive(Clone)]
pub struct GitHub {
    pub client: Octocrab,
}

#[derive(serde::Serialize)]
struct PageParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    per_page: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
}

// Only the first page is read
const FIRST_PAGE: PageParams = PageParams { per_page: Some(100), page: Some(1) };

impl GitHub {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Octocrab::builder()
            .base_uri(settings.api_url.as_str().trim_end_matches('/'))
            .with_context(|| format!("Invalid GitHub API URL {}", settings.api_url))?
            .personal_token(settings.token.clone())
            // Failed calls abort the lookup, never resend them
            .add_retry_config(RetryConfig::None)
            .build()
            .context("Failed to create GitHub client")?;
        Ok(Self { client })
    }
}

impl JobSource for GitHub {
    async fn workflow_run(&self, identity: &RunIdentity) -> Result<WorkflowRunMetadata> {
        let route =
            format!("/repos/{}/{}/actions/runs/{}", identity.owner, identity.repo, identity.run_id);
        let run: WorkflowRun = self.client.get(route, None::<&()>).await?;
        tracing::debug!("Run {} (number {})", identity.run_id, run.run_number);
        Ok(run.into())
    }

    async fn jobs(&self, identity: &RunIdentity) -> Result<Vec<JobRecord>> {
        let route = format!(
            "/repos/{}/{}/actions/runs/{}/attempts/{}/jobs",
            identity.owner, identity.repo, identity.run_id, identity.run_attempt
        );
        let list: JobList = self.client.get(route, Some(&FIRST_PAGE)).await?;
        if list.total_count > list.jobs.len() as u64 {
            tracing::warn!(
                "Run {} attempt {} has {} jobs, only the first {} were fetched",
                identity.run_id,
                identity.run_attempt,
                list.total_count,
                list.jobs.len()
            );
        }
        Ok(list.jobs.into_iter().map(JobRecord::from).collect())
    }

    async fn check_runs(
        &self,
        identity: &RunIdentity,
        git_ref: &str,
    ) -> Result<Vec<CheckRunRecord>> {
        let route =
            format!("/repos/{}/{}/commits/{}/check-runs", identity.owner, identity.repo, git_ref);
        let list: CheckRunList = self.client.get(route, Some(&FIRST_PAGE)).await?;
        Ok(list.check_runs.into_iter().map(CheckRunRecord::from).collect())
    }
}
