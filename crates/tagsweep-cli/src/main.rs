//! tagsweep - scheduled tag cleanup for Harbor-style registries
//!
//! Every option can also be given through its `HARBOR_*` environment
//! variable, which is how the job is usually wired into a cron schedule.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tagsweep_core::config::{
    ENV_EXCLUDE_TAGS, ENV_FAIL_FAST, ENV_INSECURE, ENV_PASSWORD, ENV_PROJECTS, ENV_REGISTRY,
    ENV_TAGS, ENV_TIMEOUT_SECS, ENV_USERNAME,
};
use tagsweep_core::{init_tracing, LogFormat, SweepConfig, SweepError, SweepReport};
use tracing::{error, info, Level};

const USAGE_HINT: &str = "HARBOR_REGISTRY, HARBOR_USERNAME, HARBOR_PASSWORD, HARBOR_PROJECTS, \
and HARBOR_TAGS environment variables must be set";

#[derive(Parser, Debug)]
#[command(name = "tagsweep")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Delete matching image tags from a Harbor registry", long_about = None)]
struct Cli {
    /// Registry base URL
    #[arg(long, env = ENV_REGISTRY)]
    registry: Option<String>,

    /// Basic-auth username
    #[arg(long, env = ENV_USERNAME)]
    username: Option<String>,

    /// Basic-auth password
    #[arg(long, env = ENV_PASSWORD, hide_env_values = true)]
    password: Option<String>,

    /// Comma-separated project names
    #[arg(long, env = ENV_PROJECTS)]
    projects: Option<String>,

    /// Comma-separated keywords; tags containing any of them are deleted
    #[arg(long, env = ENV_TAGS)]
    tags: Option<String>,

    /// Comma-separated substrings that protect a tag (default: latest,arch)
    #[arg(long, env = ENV_EXCLUDE_TAGS)]
    exclude: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, env = ENV_INSECURE, num_args = 0..=1, default_missing_value = "true")]
    insecure: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = ENV_TIMEOUT_SECS)]
    timeout_secs: Option<String>,

    /// Abort on the first existence-check or listing failure
    #[arg(long, env = ENV_FAIL_FAST, num_args = 0..=1, default_missing_value = "true")]
    fail_fast: Option<String>,

    /// Write the sweep report as JSON to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Settings keyed by their environment variable names. Values are
    /// passed through raw so `SweepConfig` applies one set of parsing rules.
    fn settings(&self) -> HashMap<&'static str, String> {
        let mut settings = HashMap::new();
        let optional = [
            (ENV_REGISTRY, &self.registry),
            (ENV_USERNAME, &self.username),
            (ENV_PASSWORD, &self.password),
            (ENV_PROJECTS, &self.projects),
            (ENV_TAGS, &self.tags),
            (ENV_EXCLUDE_TAGS, &self.exclude),
            (ENV_TIMEOUT_SECS, &self.timeout_secs),
            (ENV_INSECURE, &self.insecure),
            (ENV_FAIL_FAST, &self.fail_fast),
        ];
        for (var, value) in optional {
            if let Some(value) = value {
                settings.insert(var, value.clone());
            }
        }
        settings
    }

    fn sweep_config(&self) -> Result<SweepConfig> {
        let settings = self.settings();
        SweepConfig::from_lookup(|var| settings.get(var).cloned()).map_err(|err| match err {
            SweepError::MissingConfig { .. } => anyhow::Error::new(err).context(USAGE_HINT),
            other => anyhow::Error::new(other).context("invalid configuration"),
        })
    }
}

fn log_summary(report: &SweepReport) {
    info!(
        sweep_id = %report.sweep_id,
        projects = report.projects.len(),
        deleted = report.deleted(),
        failed_deletions = report.failed_deletions(),
        errors = report.error_count(),
        "Sweep complete"
    );
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(LogFormat::from_json_flag(cli.json), level);

    let config = cli.sweep_config()?;
    let report = tagsweep_core::sweep_registry(&config)
        .await
        .context("sweep aborted")?;

    log_summary(&report);
    if let Some(path) = &cli.report {
        report
            .write_json(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    if report.has_errors() {
        error!("Sweep finished with {} listing error(s)", report.error_count());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
