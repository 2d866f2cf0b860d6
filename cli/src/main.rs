//! dkron-ctl
//!
//! Query a Dkron cluster and keep its jobs in a desired state. Every
//! command prints a JSON object with a `changed` flag on stdout.

mod commands;
mod config;
mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dkron_core::{ClusterClient, InfoKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::JobArgs;
use crate::config::{ConnectionArgs, Profile};

#[derive(Parser)]
#[command(name = "dkron-ctl", author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Profile file with connection defaults [default: ~/.config/dkron/ctl.toml]
    #[arg(long, env = "DKRON_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log requests and responses to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show cluster status, leader, members and jobs
    ClusterInfo {
        /// Section to query: all, status, leader, members, nodes or jobs
        #[arg(long = "type", default_value = "all")]
        kind: InfoKind,

        /// Only list jobs with an execution in progress
        #[arg(long)]
        busy_only: bool,
    },
    /// Show job configuration and execution history
    JobInfo {
        /// Job to describe (repeatable); every job when omitted
        #[arg(long = "job-name")]
        job_names: Vec<String>,

        /// Keep only the N most recent executions; 0 keeps all
        #[arg(long, default_value_t = 0)]
        limit_history: usize,
    },
    /// Create, delete or toggle a job
    Job(JobArgs),
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<output::Outcome> {
    let profile = Profile::load(cli.config.as_deref())?;
    let endpoint = cli.connection.resolve(profile);
    let client = ClusterClient::new(&endpoint)?;
    tracing::debug!(base_url = %client.base_url(), "client ready");

    match cli.command {
        Commands::ClusterInfo { kind, busy_only } => {
            commands::cluster_info(&client, kind, busy_only)
        }
        Commands::JobInfo {
            job_names,
            limit_history,
        } => commands::job_info(&client, &job_names, limit_history),
        Commands::Job(args) => commands::job(&client, &args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli).and_then(|outcome| output::print_outcome(&outcome)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            output::print_failure(&e);
            ExitCode::FAILURE
        }
    }
}
