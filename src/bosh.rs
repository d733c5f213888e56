use anyhow::Result;

use crate::runner::{CommandResult, CommandRunner, CommandSpec};

/// Drives the `bosh` CLI against one deployment through an injected runner.
pub struct Bosh<'a> {
    runner: &'a dyn CommandRunner,
    binary: String,
    deployment: String,
}

impl<'a> Bosh<'a> {
    pub fn new(runner: &'a dyn CommandRunner, binary: &str, deployment: &str) -> Self {
        Self {
            runner,
            binary: binary.to_string(),
            deployment: deployment.to_string(),
        }
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    /// `bosh -d <deployment> ssh <instance> <remote_command>`. The remote
    /// command is a single argument and is interpreted by the remote shell.
    pub fn ssh(&self, instance: &str, remote_command: &str) -> Result<CommandResult> {
        let spec = self.base().args(["ssh", instance, remote_command]);
        self.runner.run(&spec)
    }

    /// `bosh -d <deployment> scp <source> <destination>`. Remote endpoints
    /// are written as `instance:path`, see [`remote_path`].
    pub fn scp(&self, source: &str, destination: &str) -> Result<CommandResult> {
        let spec = self.base().args(["scp", source, destination]);
        self.runner.run(&spec)
    }

    fn base(&self) -> CommandSpec {
        CommandSpec::new(&self.binary)
            .arg("-d")
            .arg(&self.deployment)
    }
}

pub fn remote_path(instance: &str, path: &str) -> String {
    format!("{}:{}", instance, path)
}
