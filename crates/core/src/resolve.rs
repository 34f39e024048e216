use crate::{
    JobInfoError,
    models::{CheckRunRecord, JobRecord, ResolvedJobInfo, RunIdentity, WorkflowRunMetadata},
};

/// Find the first job named exactly `name`, in the order the platform returned them.
pub fn find_job<'a>(
    jobs: &'a [JobRecord],
    name: &str,
    run_id: u64,
) -> Result<&'a JobRecord, JobInfoError> {
    jobs.iter()
        .find(|job| job.name == name)
        .ok_or_else(|| JobInfoError::JobNotFound { job: name.to_string(), run_id })
}

/// Summary of the check-run created for `job_id`, if any.
pub fn find_summary(check_runs: &[CheckRunRecord], job_id: u64) -> Option<&str> {
    let job_id = job_id.to_string();
    check_runs
        .iter()
        .find(|run| run.external_id.as_deref() == Some(job_id.as_str()))
        .and_then(|run| run.summary.as_deref())
}

pub struct DeriveOptions<'a> {
    /// Used when the run reports no name.
    pub fallback_workflow: &'a str,
    pub include_job_summary_anchor: bool,
}

pub fn derive_job_info(
    identity: &RunIdentity,
    run: &WorkflowRunMetadata,
    job: &JobRecord,
    check_runs: Option<&[CheckRunRecord]>,
    options: &DeriveOptions,
) -> ResolvedJobInfo {
    let run_url = identity.run_url();
    let job_url = format!("{run_url}/job/{}", job.id);
    let job_summary_url = if options.include_job_summary_anchor {
        format!("{run_url}#summary-{}", job.id)
    } else {
        run_url.clone()
    };
    // Not a documented route; links to the job's logs on the commit checks page
    let job_summary_raw_url =
        format!("{}/commit/{}/checks/{}/logs", identity.repo_url(), job.head_sha, job.id);
    let workflow_name = run
        .name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(options.fallback_workflow)
        .to_string();
    let workflow_path = run.path.clone().filter(|p| !p.is_empty()).unwrap_or_default();
    let job_summary_content =
        check_runs.map(|runs| find_summary(runs, job.id).unwrap_or_default().to_string());
    ResolvedJobInfo {
        run_url,
        job_id: job.id,
        job_name: job.name.clone(),
        job_url,
        job_summary_url,
        job_summary_raw_url,
        job_status: job.status.clone(),
        job_conclusion: job.conclusion.clone(),
        job_started_at: job.started_at.clone(),
        job_completed_at: job.completed_at.clone(),
        workflow_name,
        workflow_path,
        run_number: run.run_number,
        job_summary_content,
    }
}
