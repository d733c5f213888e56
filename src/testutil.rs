#![cfg(test)]

use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tempfile::TempDir;

use crate::config::SmokeConfig;
use crate::runner::{CommandResult, CommandRunner, CommandSpec};
use crate::wait::{WaitStrategy, Waiter};

type Handler = Box<dyn Fn(&CommandSpec) -> Result<CommandResult>>;

struct Rule {
    needle: String,
    remaining: Option<usize>,
    handler: Handler,
}

/// Scripted runner that records every spec it is asked to run.
///
/// Rules match when the space-joined argument list contains `needle`; the
/// first live match wins. Unmatched commands succeed with empty output.
pub struct FakeRunner {
    rules: RefCell<Vec<Rule>>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            rules: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn exit(code: i32, stdout: &str, stderr: &str) -> CommandResult {
        CommandResult {
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
            exit_status: code,
        }
    }

    pub fn respond(self, needle: &str, result: CommandResult) -> Self {
        self.rule(needle, None, move |_| Ok(result.clone()))
    }

    /// Like [`respond`](Self::respond) but only for the first `times` matches.
    pub fn respond_times(self, needle: &str, times: usize, result: CommandResult) -> Self {
        self.rule(needle, Some(times), move |_| Ok(result.clone()))
    }

    pub fn fail(self, needle: &str, message: &str) -> Self {
        let message = message.to_string();
        self.rule(needle, None, move |_| Err(anyhow!("{}", message)))
    }

    pub fn respond_with(
        self,
        needle: &str,
        handler: impl Fn(&CommandSpec) -> Result<CommandResult> + 'static,
    ) -> Self {
        self.rule(needle, None, handler)
    }

    fn rule(
        self,
        needle: &str,
        remaining: Option<usize>,
        handler: impl Fn(&CommandSpec) -> Result<CommandResult> + 'static,
    ) -> Self {
        self.rules.borrow_mut().push(Rule {
            needle: needle.to_string(),
            remaining,
            handler: Box::new(handler),
        });
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// The argument lists of every call, for compact assertions.
    pub fn arg_lists(&self) -> Vec<Vec<String>> {
        self.calls.borrow().iter().map(|c| c.args.clone()).collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandResult> {
        self.calls.borrow_mut().push(spec.clone());
        let joined = spec.args.join(" ");

        let mut rules = self.rules.borrow_mut();
        for rule in rules.iter_mut() {
            if !joined.contains(&rule.needle) {
                continue;
            }
            match rule.remaining {
                Some(0) => continue,
                Some(ref mut n) => *n -= 1,
                None => {}
            }
            return (rule.handler)(spec);
        }
        Ok(Self::exit(0, "", ""))
    }
}

/// Waiter that never actually sleeps.
pub fn instant_waiter(strategy: WaitStrategy) -> Waiter {
    Waiter::with_sleeper(
        strategy,
        Duration::from_secs(5),
        Duration::from_secs(20),
        |_| {},
    )
}

/// Waiter that records every requested sleep instead of sleeping.
pub fn recording_waiter(strategy: WaitStrategy) -> (Waiter, Rc<RefCell<Vec<Duration>>>) {
    let slept = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&slept);
    let waiter = Waiter::with_sleeper(
        strategy,
        Duration::from_secs(5),
        Duration::from_secs(20),
        move |d| sink.borrow_mut().push(d),
    );
    (waiter, slept)
}

pub fn default_config() -> SmokeConfig {
    SmokeConfig::default()
}

/// Scratch directory for config files.
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    pub fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join("config.toml");
        std::fs::write(&path, contents).expect("failed to write config");
        path
    }

    pub fn missing_path(&self) -> PathBuf {
        self.dir.path().join("nope.toml")
    }
}
