mod args;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use job_info_core::{JobSource, config::Settings, resolve_job_info};
use job_info_github::GitHub;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
    args::Args,
    output::{OutputTarget, error_command},
};

fn env(key: &str) -> Option<String> { std::env::var(key).ok() }

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // The runner sets RUNNER_DEBUG when step debug logging is enabled
    let default_level = match env("RUNNER_DEBUG").as_deref() {
        Some("1") => LevelFilter::DEBUG,
        _ => LevelFilter::INFO,
    };
    let env_filter =
        EnvFilter::builder().with_default_directive(default_level.into()).from_env_lossy();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_filter(env_filter))
        .init();

    let args: Args = argp::parse_args_or_exit(argp::DEFAULT);
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("{:?}", e);
            // Stdout carries workflow commands
            println!("{}", error_command(&format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = args.resolve_inputs(env)?.validate()?;
    tracing::debug!("{:?}", settings);
    let github = GitHub::new(&settings)?;
    run_with(&github, &settings, &OutputTarget::new(args.output, env)).await
}

/// Outputs are published only once the whole resolution succeeded.
async fn run_with<S: JobSource>(
    source: &S,
    settings: &Settings,
    target: &OutputTarget,
) -> Result<()> {
    let info = resolve_job_info(source, settings).await?;
    target.publish(&info.outputs())
}
