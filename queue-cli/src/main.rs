//! Pipeline Queue
//!
//! Blocks a CI job until it is the oldest running instance among a set of
//! mutually exclusive ("singleton") job names in its GitLab project.
//!
//! Architecture:
//! - Configuration: command line, defaulting to GitLab CI variables
//! - Repository: job queries against the GitLab API
//! - Service: collecting the running singleton jobs
//! - Scheduler: the admission gate's poll loop and query retry policy
//!
//! Exit codes: 0 admitted, 1 error, 2 maximum wait exceeded, 130 cancelled.

mod config;
mod repository;
mod scheduler;
mod service;
mod shutdown;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use colored::*;
use queue_client::{GitLabClient, Token, TokenKind};
use queue_core::{JobId, SingletonJobs};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::scheduler::{AdmissionGate, GateError, Outcome, RetryPolicy};

const USER_AGENT: &str = concat!("pipeline-queue/", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(name = "pipeline-queue", version)]
#[command(about = "Blocks until older singleton jobs finish running")]
#[command(long_about = "Blocks until older singleton jobs finish running.

Queries the GitLab API for the project's running jobs whose names are in the
singleton set and orders them by start time. If the current job is not the
oldest one, sleeps for the poll interval and checks again. Once it is the
oldest running singleton job, exits successfully so the job can proceed.")]
struct Cli {
    /// API access token
    #[arg(
        short = 't',
        long,
        env = "CI_JOB_TOKEN",
        default_value = "",
        hide_env_values = true,
        hide_default_value = true
    )]
    token: String,

    /// Header the token is sent in
    #[arg(long, value_enum, default_value_t = TokenHeader::Private)]
    token_header: TokenHeader,

    /// Hostname of the GitLab instance
    #[arg(
        short = 'n',
        long,
        env = "CI_SERVER_URL",
        default_value = "https://gitlab.com"
    )]
    hostname: String,

    /// Time to wait in-between polls (e.g. 30s, 2m)
    #[arg(short = 'i', long = "interval-time", default_value = "30s", value_parser = humantime::parse_duration)]
    interval_time: Duration,

    /// Project ID of the pipeline to run in
    #[arg(short = 'j', long = "project", env = "CI_PROJECT_ID")]
    project: u64,

    /// Jobs that must not run concurrently (comma separated or repeated)
    #[arg(short = 's', long = "singletonjobs", value_delimiter = ',')]
    singleton_jobs: Vec<String>,

    /// Job ID of the current job
    #[arg(short = 'o', long = "jobid", env = "CI_JOB_ID")]
    job_id: JobId,

    /// Timeout for each API request
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    request_timeout: Duration,

    /// Give up after waiting this long (default: wait indefinitely)
    #[arg(long, value_parser = humantime::parse_duration)]
    max_wait: Option<Duration>,

    /// Retries for a query failing with a transient error
    #[arg(long, default_value_t = 0)]
    query_retries: u32,

    /// Delay before the first query retry, doubled on each further retry
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    retry_backoff: Duration,

    /// Upper bound on the query retry delay
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    retry_backoff_max: Duration,
}

/// Header a token is sent in
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TokenHeader {
    /// PRIVATE-TOKEN (personal, project or group access token)
    Private,
    /// JOB-TOKEN (CI job token)
    Job,
}

impl From<TokenHeader> for TokenKind {
    fn from(header: TokenHeader) -> Self {
        match header {
            TokenHeader::Private => TokenKind::Private,
            TokenHeader::Job => TokenKind::Job,
        }
    }
}

impl Cli {
    fn into_config(self) -> Config {
        let singleton_jobs = SingletonJobs::new(&self.singleton_jobs);
        let mut config = Config::new(self.project, self.job_id, singleton_jobs);

        config.hostname = self.hostname;
        config.token = Token::new(self.token, self.token_header.into());
        config.poll_interval = self.interval_time;
        config.request_timeout = self.request_timeout;
        config.max_wait = self.max_wait;
        config.retry = RetryPolicy::new(
            self.query_retries,
            self.retry_backoff,
            self.retry_backoff_max,
        );

        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipeline_queue=info,queue_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_code(e.kind()));
        }
    };
    let config = cli.into_config();
    let job_id = config.job_id;

    match run(config).await {
        Ok(Outcome::Admitted { polls, waited }) => {
            println!(
                "{} {}",
                "✓".green().bold(),
                format!(
                    "Job {} is first in line after {} poll(s) ({}), proceeding",
                    job_id,
                    polls,
                    humantime::format_duration(round_to_secs(waited))
                )
                .green()
            );
            ExitCode::SUCCESS
        }
        Ok(Outcome::DeadlineExceeded { polls }) => {
            eprintln!(
                "{} {}",
                "[error]".red().bold(),
                format!(
                    "Job {} was still not first after {} poll(s); maximum wait exceeded",
                    job_id, polls
                )
                .red()
            );
            ExitCode::from(2)
        }
        Ok(Outcome::Cancelled { polls }) => {
            eprintln!(
                "{} {}",
                "⚠".yellow(),
                format!("Cancelled after {} poll(s), before our turn came", polls).yellow()
            );
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!(
                "{} {}{}",
                "[error]".red().bold(),
                format!("{:#}", e).red(),
                auth_hint(&e).dimmed()
            );
            ExitCode::FAILURE
        }
    }
}

/// Validates the configuration and waits for our turn
async fn run(config: Config) -> Result<Outcome> {
    config.validate().context("Invalid configuration")?;

    info!(
        "Jobs that should not run concurrently are: {}",
        config.singleton_jobs
    );

    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;
    let client = Arc::new(GitLabClient::with_client(
        config.hostname.clone(),
        config.token.clone(),
        http_client,
    ));

    info!("GitLab client initialized for {}", client.base_url());

    let cancel = CancellationToken::new();
    // stops the signal listener once we return
    let _guard = cancel.clone().drop_guard();
    shutdown::cancel_on_signal(cancel.clone());

    let gate = AdmissionGate::new(config, client);
    let outcome = gate.await_turn(&cancel).await?;

    Ok(outcome)
}

/// Exit code for a command line that did not parse
///
/// Exit code 2 is reserved for an exceeded maximum wait, so argument errors
/// exit 1 like any other error.
fn usage_exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Suffix pointing at the token options when the API rejected our credentials
fn auth_hint(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<GateError>() {
        Some(GateError::Collect(e)) if e.client_error().is_auth_error() => {
            " (check --token and --token-header)"
        }
        _ => "",
    }
}

fn round_to_secs(duration: Duration) -> Duration {
    Duration::from_secs(duration.as_secs())
}
