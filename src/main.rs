mod bosh;
mod cli;
mod commands;
mod config;
mod expect;
mod logging;
mod runner;
mod scenarios;
mod staging;
mod testutil;
mod wait;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use runner::ExecRunner;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns the process exit code.
fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Run {
            focus,
            skip,
            deployment,
            bosh_binary,
            wait,
        } => {
            let overrides = config::Overrides {
                bosh_binary,
                deployment,
                wait,
            };
            let config = config::resolve_config(cli.config.as_deref(), overrides)?;
            let waiter = config.wait.waiter();
            let runner = ExecRunner::new();

            let inputs = commands::RunInputs { focus, skip };
            let result = commands::cmd_run(&inputs, &config, &runner, &waiter)?;
            output(&result, cli.json, commands::format_run_human)?;
            Ok(if result.has_failures() { 1 } else { 0 })
        }
        Command::List => {
            let result = commands::cmd_list();
            output(&result, cli.json, commands::format_list_human)?;
            Ok(0)
        }
        Command::Exec { cwd, env, cmd } => {
            let inputs = commands::ExecInputs { cmd, cwd, env };
            let result = commands::cmd_exec(&ExecRunner::new(), &inputs)?;
            output(&result, cli.json, commands::format_exec_human)?;
            Ok(match result.result.exit_status {
                code @ 0..=255 => code,
                _ => 1,
            })
        }
    }
}

fn output<T: serde::Serialize>(result: &T, json: bool, human_fn: fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        let text = human_fn(result);
        if !text.is_empty() {
            println!("{}", text);
        }
    }
    Ok(())
}
