mod commands;
mod config;
mod context;
mod drift;
mod loader;
mod output;
mod sink;
mod traits;

#[cfg(test)]
mod test_helpers;

use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use commands::{AnalyzeCommand, AnalyzeOptions, DEFAULT_OUTPUT_PATH, SummaryCommand};
use context::Context;
use sink::{Credentials, DEFAULT_KEY, DEFAULT_REGION, S3Config};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit code when `--fail-on-drift` is set and drift was found
const DRIFT_EXIT_CODE: u8 = 2;

/// Runs `analyze` when invoked with flags and no subcommand
#[derive(Parser)]
#[command(name = "driftscan")]
#[command(about = "Compare live cloud resources against Infrastructure as Code declarations", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    analyze: AnalyzeArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare cloud resources against IaC resources and write a drift report
    Analyze(AnalyzeArgs),

    /// Recount and display the summary of a saved report
    Summary {
        /// Path to a report written by `analyze`
        #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
        report: PathBuf,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Path to cloud resources JSON
    #[arg(long, required = true)]
    cloud: Option<PathBuf>,

    /// Path to IaC resources JSON
    #[arg(long, required = true)]
    iac: Option<PathBuf>,

    /// Path to write the analysis report
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    out: PathBuf,

    /// Analyzer config file (defaults to ./.driftscan.yaml or ~/.driftscan/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not print the JSON report to stdout
    #[arg(short, long)]
    quiet: bool,

    /// Exit with status 2 when any resource is Modified or Missing
    #[arg(long)]
    fail_on_drift: bool,

    #[command(flatten)]
    s3: S3Args,
}

impl AnalyzeArgs {
    fn into_options(self) -> Result<AnalyzeOptions> {
        Ok(AnalyzeOptions {
            cloud: self.cloud.context("--cloud is required")?,
            iac: self.iac.context("--iac is required")?,
            out: self.out,
            config: self.config,
            upload: self.s3.into_config(),
            quiet: self.quiet,
        })
    }
}

#[derive(Args)]
struct S3Args {
    /// Upload the report to this S3 bucket
    #[arg(long)]
    s3_bucket: Option<String>,

    /// S3 key for the uploaded report
    #[arg(long, default_value = DEFAULT_KEY)]
    s3_key: String,

    /// S3-compatible endpoint URL (e.g. http://localhost:4566 for LocalStack)
    #[arg(long, env = "AWS_ENDPOINT_URL")]
    s3_endpoint: Option<String>,

    /// Region used to sign the upload
    #[arg(long, env = "AWS_DEFAULT_REGION", default_value = DEFAULT_REGION)]
    s3_region: String,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true, hide = true)]
    aws_access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true, hide = true)]
    aws_secret_access_key: Option<String>,

    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true, hide = true)]
    aws_session_token: Option<String>,
}

impl S3Args {
    /// Upload configuration, if a bucket was requested
    fn into_config(self) -> Option<S3Config> {
        let bucket = self.s3_bucket?;
        Some(S3Config {
            bucket,
            key: self.s3_key,
            endpoint: self.s3_endpoint,
            region: self.s3_region,
            credentials: Credentials {
                access_key_id: self.aws_access_key_id.unwrap_or_default(),
                secret_access_key: self.aws_secret_access_key.unwrap_or_default(),
                session_token: self.aws_session_token.filter(|t| !t.is_empty()),
            },
        })
    }
}

fn run(ctx: &Context, cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Some(Commands::Analyze(args)) => analyze(ctx, args),
        None => analyze(ctx, cli.analyze),
        Some(Commands::Summary { report }) => {
            SummaryCommand::execute(ctx, &report)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn analyze(ctx: &Context, args: AnalyzeArgs) -> Result<ExitCode> {
    let fail_on_drift = args.fail_on_drift;
    let report = AnalyzeCommand::execute(ctx, &args.into_options()?)?;

    if fail_on_drift && report.has_drift() {
        return Ok(ExitCode::from(DRIFT_EXIT_CODE));
    }
    Ok(ExitCode::SUCCESS)
}

/// Map a command result to the process exit code, reporting any error
fn finish(ctx: &Context, result: Result<ExitCode>) -> ExitCode {
    match result {
        Ok(code) => code,
        Err(err) => {
            ctx.output.error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let ctx = Context::new();
    let result = run(&ctx, Cli::parse());
    finish(&ctx, result)
}
