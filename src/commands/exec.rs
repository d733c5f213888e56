use anyhow::{bail, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::runner::{CommandResult, CommandRunner, CommandSpec};

#[derive(Debug, Serialize)]
pub struct ExecResult {
    pub command: String,
    #[serde(flatten)]
    pub result: CommandResult,
}

pub struct ExecInputs {
    pub cmd: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// Raw `KEY=VALUE` strings from --env.
    pub env: Vec<String>,
}

/// Runs one local command through the runner, exactly as scenarios do.
pub fn cmd_exec(runner: &dyn CommandRunner, inputs: &ExecInputs) -> Result<ExecResult> {
    let Some((program, args)) = inputs.cmd.split_first() else {
        bail!("no command specified");
    };

    let mut spec = CommandSpec::new(program.as_str()).args(args.iter().map(String::as_str));
    if let Some(dir) = &inputs.cwd {
        spec = spec.current_dir(dir);
    }
    for pair in &inputs.env {
        match pair.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                spec = spec.env(key, value);
            }
            _ => {
                bail!(
                    "invalid --env format: {:?}\n  hint: use --env NAME=value",
                    pair
                );
            }
        }
    }
    let result = runner.run(&spec)?;

    Ok(ExecResult {
        command: spec.display(),
        result,
    })
}

pub fn format_exec_human(result: &ExecResult) -> String {
    let mut lines = vec![format!("$ {}", result.command)];
    lines.push(format!("exit status: {}", result.result.exit_status));
    for (label, stream) in [
        ("stdout", result.result.stdout_lossy()),
        ("stderr", result.result.stderr_lossy()),
    ] {
        if stream.is_empty() {
            continue;
        }
        lines.push(format!("--- {} ---", label));
        lines.push(stream.trim_end().to_string());
    }
    lines.join("\n")
}
