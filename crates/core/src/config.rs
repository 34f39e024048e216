use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{JobInfoError, models::RunIdentity};

pub const DEFAULT_SERVER_URL: &str = "https://github.com";
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Raw, unvalidated inputs. Each layer (CLI flags, action inputs, config file,
/// runner context) produces one of these; they are merged with [`Inputs::or`].
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Inputs {
    pub repository: Option<String>,
    pub server_url: Option<String>,
    pub api_url: Option<String>,
    pub workflow: Option<String>,
    pub run_id: Option<String>,
    pub run_attempt: Option<String>,
    pub job: Option<String>,
    pub github_token: Option<String>,
    pub include_job_summary_anchor: Option<String>,
    pub include_job_summary_content: Option<String>,
}

impl Inputs {
    /// Action inputs as exposed by the runner: `INPUT_<NAME>`, trimmed.
    /// Empty values are treated as unset.
    pub fn from_action_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let input = |name: &str| {
            lookup(&format!("INPUT_{}", name.replace(' ', "_").to_uppercase()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            repository: input("repository"),
            server_url: input("server_url"),
            api_url: input("api_url"),
            workflow: input("workflow"),
            run_id: input("run_id"),
            run_attempt: input("run_attempt"),
            job: input("job"),
            github_token: input("github_token"),
            include_job_summary_anchor: input("include_job_summary_anchor"),
            include_job_summary_content: input("include_job_summary_content"),
        }
    }

    /// Defaults taken from the runner's `GITHUB_*` context variables.
    pub fn from_runner_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        Self {
            repository: var("GITHUB_REPOSITORY"),
            server_url: var("GITHUB_SERVER_URL"),
            api_url: var("GITHUB_API_URL"),
            workflow: var("GITHUB_WORKFLOW"),
            run_id: var("GITHUB_RUN_ID"),
            run_attempt: var("GITHUB_RUN_ATTEMPT"),
            job: var("GITHUB_JOB"),
            github_token: var("GITHUB_TOKEN"),
            include_job_summary_anchor: None,
            include_job_summary_content: None,
        }
    }

    /// Field-wise merge, preferring values already set on `self`.
    pub fn or(self, other: Inputs) -> Inputs {
        Inputs {
            repository: self.repository.or(other.repository),
            server_url: self.server_url.or(other.server_url),
            api_url: self.api_url.or(other.api_url),
            workflow: self.workflow.or(other.workflow),
            run_id: self.run_id.or(other.run_id),
            run_attempt: self.run_attempt.or(other.run_attempt),
            job: self.job.or(other.job),
            github_token: self.github_token.or(other.github_token),
            include_job_summary_anchor: self
                .include_job_summary_anchor
                .or(other.include_job_summary_anchor),
            include_job_summary_content: self
                .include_job_summary_content
                .or(other.include_job_summary_content),
        }
    }

    pub fn validate(self) -> Result<Settings, JobInfoError> {
        let repository = required("repository", self.repository)?;
        let (owner, repo) = parse_repository(&repository)?;
        let run_id = parse_id("run_id", &required("run_id", self.run_id)?)?;
        let run_attempt = parse_id("run_attempt", self.run_attempt.as_deref().unwrap_or("1"))?;
        let job = required("job", self.job)?;
        let token = required("github_token", self.github_token)?;
        let api_url = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        let api_url = Url::parse(api_url).map_err(|e| {
            JobInfoError::InvalidInput(format!("Input \"api_url\" is not a valid URL: {e}"))
        })?;
        Ok(Settings {
            identity: RunIdentity {
                owner,
                repo,
                run_id,
                run_attempt,
                server_url: self.server_url.unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            },
            workflow: self.workflow.unwrap_or_default(),
            job,
            token,
            api_url,
            include_job_summary_anchor: parse_bool(
                "include_job_summary_anchor",
                self.include_job_summary_anchor.as_deref(),
            )?,
            include_job_summary_content: parse_bool(
                "include_job_summary_content",
                self.include_job_summary_content.as_deref(),
            )?,
        })
    }
}

/// Validated inputs for one execution.
#[derive(Clone)]
pub struct Settings {
    pub identity: RunIdentity,
    /// Fallback workflow name, used when the run has none.
    pub workflow: String,
    pub job: String,
    pub token: String,
    pub api_url: Url,
    pub include_job_summary_anchor: bool,
    pub include_job_summary_content: bool,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("identity", &self.identity)
            .field("workflow", &self.workflow)
            .field("job", &self.job)
            .field("token", &"***")
            .field("api_url", &self.api_url.as_str())
            .field("include_job_summary_anchor", &self.include_job_summary_anchor)
            .field("include_job_summary_content", &self.include_job_summary_content)
            .finish()
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, JobInfoError> {
    value.filter(|v| !v.is_empty()).ok_or_else(|| {
        JobInfoError::InvalidInput(format!("Input required and not supplied: {name}"))
    })
}

/// Split `owner/repo`. Exactly one `/` with non-empty halves.
pub fn parse_repository(value: &str) -> Result<(String, String), JobInfoError> {
    match value.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(JobInfoError::InvalidInput(format!(
            "Input \"repository\" must be in the form owner/repo, got \"{value}\""
        ))),
    }
}

pub fn parse_id(name: &str, value: &str) -> Result<u64, JobInfoError> {
    value.trim().parse::<u64>().map_err(|_| {
        JobInfoError::InvalidInput(format!(
            "Input \"{name}\" must be a non-negative integer, got \"{value}\""
        ))
    })
}

/// Booleans follow the YAML 1.2 core schema. Unset means `false`.
pub fn parse_bool(name: &str, value: Option<&str>) -> Result<bool, JobInfoError> {
    match value {
        None | Some("") => Ok(false),
        Some("true" | "True" | "TRUE") => Ok(true),
        Some("false" | "False" | "FALSE") => Ok(false),
        Some(_) => Err(JobInfoError::InvalidInput(format!(
            "Input does not meet YAML 1.2 \"Core Schema\" specification: {name}\n\
             Support boolean input list: `true | True | TRUE | false | False | FALSE`"
        ))),
    }
}
