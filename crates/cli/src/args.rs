use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use argp::FromArgs;
use job_info_core::config::Inputs;

#[derive(FromArgs, PartialEq, Eq, Debug, Default)]
/// Resolve a job in a GitHub Actions workflow run and publish its URLs and status.
pub struct Args {
    #[argp(option)]
    /// repository in owner/repo form
    pub repository: Option<String>,
    #[argp(option)]
    /// server base URL used to build links
    pub server_url: Option<String>,
    #[argp(option)]
    /// REST API base URL
    pub api_url: Option<String>,
    #[argp(option)]
    /// workflow name used when the run has none
    pub workflow: Option<String>,
    #[argp(option)]
    /// workflow run ID
    pub run_id: Option<String>,
    #[argp(option)]
    /// workflow run attempt
    pub run_attempt: Option<String>,
    #[argp(option, short = 'j')]
    /// job name to look up
    pub job: Option<String>,
    #[argp(option)]
    /// token used for API requests
    pub github_token: Option<String>,
    #[argp(option)]
    /// append #summary-<job id> to the job summary URL (true/false)
    pub include_job_summary_anchor: Option<String>,
    #[argp(option)]
    /// fetch the job's check-run summary (true/false)
    pub include_job_summary_content: Option<String>,
    #[argp(option, short = 'c')]
    /// YAML file with input values
    pub config: Option<PathBuf>,
    #[argp(option, short = 'o')]
    /// write outputs to this file instead of $GITHUB_OUTPUT
    pub output: Option<PathBuf>,
}

impl Args {
    pub fn inputs(&self) -> Inputs {
        Inputs {
            repository: self.repository.clone(),
            server_url: self.server_url.clone(),
            api_url: self.api_url.clone(),
            workflow: self.workflow.clone(),
            run_id: self.run_id.clone(),
            run_attempt: self.run_attempt.clone(),
            job: self.job.clone(),
            github_token: self.github_token.clone(),
            include_job_summary_anchor: self.include_job_summary_anchor.clone(),
            include_job_summary_content: self.include_job_summary_content.clone(),
        }
    }

    /// Merge all input layers: flags, then `INPUT_*` action inputs, then the
    /// config file, then the runner's `GITHUB_*` variables.
    pub fn resolve_inputs(&self, env: impl Fn(&str) -> Option<String>) -> Result<Inputs> {
        let file = match &self.config {
            Some(path) => load_config(path)?,
            None => Inputs::default(),
        };
        Ok(self
            .inputs()
            .or(Inputs::from_action_env(&env))
            .or(file)
            .or(Inputs::from_runner_env(&env)))
    }
}

fn load_config(path: &Path) -> Result<Inputs> {
    let file = BufReader::new(
        File::open(path).with_context(|| format!("Failed to open config file {}", path.display()))?,
    );
    serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}
