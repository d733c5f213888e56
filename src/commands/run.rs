use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;
use std::time::Instant;

use crate::config::SmokeConfig;
use crate::expect::is_assertion;
use crate::runner::CommandRunner;
use crate::scenarios::{catalog, Scenario, SuiteContext};
use crate::wait::{WaitStrategy, Waiter};

pub struct RunInputs {
    /// Keep only scenarios whose id contains one of these.
    pub focus: Vec<String>,
    /// Skip scenarios whose id contains one of these.
    pub skip: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RunResult {
    pub deployment: String,
    pub bosh_binary: String,
    pub wait: WaitStrategy,
    pub started_at: DateTime<Utc>,
    pub scenarios: Vec<ScenarioReport>,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunResult {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub id: String,
    pub description: String,
    pub tracker: Option<String>,
    pub elapsed_ms: u64,
    pub outcome: Outcome,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum Outcome {
    Passed,
    Failed { kind: FailureKind, message: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A command could not be run or observed to completion.
    Execution,
    /// A command ran but its result did not meet expectations.
    Assertion,
}

enum Selection {
    Run,
    Skip(String),
}

fn select(scenario: &Scenario, inputs: &RunInputs) -> Option<Selection> {
    let focused = inputs.focus.is_empty()
        || inputs.focus.iter().any(|f| scenario.id.contains(f.as_str()));
    if !focused {
        return None;
    }
    match inputs.skip.iter().find(|s| scenario.id.contains(s.as_str())) {
        Some(pattern) => Some(Selection::Skip(format!("matched --skip {:?}", pattern))),
        None => Some(Selection::Run),
    }
}

/// Runs the selected scenarios one after another. A failing scenario is
/// recorded and the suite moves on; nothing is retried here.
pub fn cmd_run(
    inputs: &RunInputs,
    config: &SmokeConfig,
    runner: &dyn CommandRunner,
    waiter: &Waiter,
) -> Result<RunResult> {
    let selected: Vec<(Scenario, Selection)> = catalog()
        .into_iter()
        .filter_map(|s| select(&s, inputs).map(|sel| (s, sel)))
        .collect();
    if selected.is_empty() {
        bail!(
            "no scenarios match --focus {}\n  hint: run `stemcell-smoke list` to see scenario ids",
            inputs.focus.join(", ")
        );
    }

    let ctx = SuiteContext::new(runner, config, waiter);

    let started_at = Utc::now();
    let mut scenarios = Vec::new();

    for (scenario, selection) in selected {
        let started = Instant::now();
        let outcome = match selection {
            Selection::Skip(reason) => {
                tracing::info!(scenario = scenario.id, %reason, "skipping scenario");
                Outcome::Skipped { reason }
            }
            Selection::Run => {
                tracing::info!(scenario = scenario.id, "running scenario");
                match (scenario.run)(&ctx) {
                    Ok(()) => Outcome::Passed,
                    Err(e) => {
                        let kind = if is_assertion(&e) {
                            FailureKind::Assertion
                        } else {
                            FailureKind::Execution
                        };
                        tracing::warn!(scenario = scenario.id, ?kind, "scenario failed");
                        Outcome::Failed {
                            kind,
                            message: format!("{:#}", e),
                        }
                    }
                }
            }
        };

        scenarios.push(ScenarioReport {
            id: scenario.id.to_string(),
            description: scenario.description.to_string(),
            tracker: scenario.tracker.map(str::to_string),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            outcome,
        });
    }

    let count = |f: fn(&Outcome) -> bool| scenarios.iter().filter(|s| f(&s.outcome)).count();
    let passed = count(|o| matches!(o, Outcome::Passed));
    let failed = count(|o| matches!(o, Outcome::Failed { .. }));
    let skipped = count(|o| matches!(o, Outcome::Skipped { .. }));

    Ok(RunResult {
        deployment: ctx.bosh.deployment().to_string(),
        bosh_binary: config.bosh.binary.clone(),
        wait: waiter.strategy(),
        started_at,
        scenarios,
        passed,
        failed,
        skipped,
    })
}

fn format_elapsed(ms: u64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}ms", ms)
    }
}

pub fn format_run_human(result: &RunResult) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {} ({} wait)",
        "Stemcell smoke tests against".blue().bold(),
        result.deployment.white().bold(),
        match result.wait {
            WaitStrategy::Fixed => "fixed",
            WaitStrategy::Poll => "poll",
        }
    ));

    for report in &result.scenarios {
        let label = match &report.tracker {
            Some(tracker) => format!("{} {}", report.id, tracker.dimmed()),
            None => report.id.clone(),
        };
        match &report.outcome {
            Outcome::Passed => lines.push(format!(
                "  {} {} {}",
                "✓".green(),
                label,
                format_elapsed(report.elapsed_ms).dimmed()
            )),
            Outcome::Failed { kind, message } => {
                let kind = match kind {
                    FailureKind::Execution => "execution error",
                    FailureKind::Assertion => "assertion failed",
                };
                lines.push(format!(
                    "  {} {} {}",
                    "✗".red(),
                    label,
                    format!("({})", kind).red()
                ));
                for line in message.lines() {
                    lines.push(format!("      {}", line));
                }
            }
            Outcome::Skipped { reason } => {
                lines.push(format!("  {} {} {}", "-".yellow(), label, reason.dimmed()));
            }
        }
    }

    let summary = format!(
        "{} passed, {} failed, {} skipped",
        result.passed, result.failed, result.skipped
    );
    lines.push(String::new());
    lines.push(if result.has_failures() {
        summary.red().bold().to_string()
    } else {
        summary.green().bold().to_string()
    });
    lines.join("\n")
}
