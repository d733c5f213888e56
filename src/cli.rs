use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::wait::WaitStrategy;

#[derive(Parser)]
#[command(
    name = "stemcell-smoke",
    about = "Smoke tests for a deployed stemcell's syslog forwarding"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the smoke scenarios against the deployment
    Run {
        /// Only run scenarios whose id contains this (repeatable)
        #[arg(long)]
        focus: Vec<String>,
        /// Skip scenarios whose id contains this (repeatable)
        #[arg(long)]
        skip: Vec<String>,
        /// Deployment name (overrides config and BOSH_DEPLOYMENT)
        #[arg(long, short = 'd')]
        deployment: Option<String>,
        /// Path to the bosh CLI (overrides config and BOSH_BINARY)
        #[arg(long)]
        bosh_binary: Option<String>,
        /// How to wait for log propagation
        #[arg(long, value_enum)]
        wait: Option<WaitStrategy>,
    },
    /// List the available scenarios
    List,
    /// Run a single local command and show its captured result
    Exec {
        /// Working directory for the command
        #[arg(long)]
        cwd: Option<PathBuf>,
        /// Extra environment variable, NAME=value (repeatable)
        #[arg(long)]
        env: Vec<String>,
        /// Command and arguments to run
        #[arg(last = true, required = true)]
        cmd: Vec<String>,
    },
}
