//! Stemcell smoke scenarios. Each one drives the deployed syslog forwarder and
//! storer through `bosh ssh`/`bosh scp` and checks what ended up in the logs.
mod audit;
mod auth_log;
mod forwarding;
mod rotation;

use anyhow::Result;

use crate::bosh::Bosh;
use crate::config::{InstanceConfig, PathConfig, SmokeConfig};
use crate::expect::expect_success;
use crate::runner::{CommandResult, CommandRunner};
use crate::wait::Waiter;

/// Everything a scenario body may touch.
pub struct SuiteContext<'a> {
    pub bosh: Bosh<'a>,
    pub waiter: &'a Waiter,
    pub instances: &'a InstanceConfig,
    pub paths: &'a PathConfig,
}

impl<'a> SuiteContext<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        config: &'a SmokeConfig,
        waiter: &'a Waiter,
    ) -> Self {
        Self {
            bosh: Bosh::new(runner, &config.bosh.binary, &config.bosh.deployment),
            waiter,
            instances: &config.instances,
            paths: &config.paths,
        }
    }

    /// Runs `remote_command` on `instance` and requires exit 0.
    pub fn ssh_ok(
        &self,
        instance: &str,
        remote_command: &str,
        message: &str,
    ) -> Result<CommandResult> {
        let result = self.bosh.ssh(instance, remote_command)?;
        expect_success(&result, message)?;
        Ok(result)
    }

    pub fn scp_ok(&self, source: &str, destination: &str, message: &str) -> Result<CommandResult> {
        let result = self.bosh.scp(source, destination)?;
        expect_success(&result, message)?;
        Ok(result)
    }

    /// `grep` on the storer's syslog store; fails if `needle` never arrived.
    pub fn storer_has(&self, needle: &str, sudo: bool) -> Result<()> {
        let grep = format!("grep '{}' {}", needle, self.paths.syslog_store);
        let command = if sudo { format!("sudo {}", grep) } else { grep };
        self.ssh_ok(
            &self.instances.storer,
            &command,
            &format!("Syslog did not contain '{}'!", needle),
        )?;
        Ok(())
    }
}

pub struct Scenario {
    pub id: &'static str,
    pub description: &'static str,
    /// Story id from the tracker the regression was filed under.
    pub tracker: Option<&'static str>,
    pub run: fn(&SuiteContext) -> Result<()>,
}

/// All scenarios, in the order they run.
pub fn catalog() -> Vec<Scenario> {
    vec![
        Scenario {
            id: "audit-modprobe",
            description: "auditd records modprobe and it is forwarded to the syslog storer",
            tracker: None,
            run: audit::modprobe_is_forwarded,
        },
        Scenario {
            id: "syslog-forwarding",
            description: "messages logged to syslog are forwarded to the syslog storer",
            tracker: None,
            run: forwarding::syslog_message_is_forwarded,
        },
        Scenario {
            id: "syslog-rotation",
            description: "syslog is rotated once the size threshold is reached",
            tracker: None,
            run: rotation::syslog_rotates_at_threshold,
        },
        Scenario {
            id: "auth-log-clean",
            description: "auth.log contains no 'No such file or directory' errors",
            tracker: Some("#134136191"),
            run: auth_log::auth_log_has_no_missing_file_errors,
        },
        Scenario {
            id: "nested-log-forwarding",
            description: "deeply nested log files are forwarded",
            tracker: Some("#133776519"),
            run: forwarding::nested_log_is_forwarded,
        },
        Scenario {
            id: "cef-agent-logs",
            description: "CEF logs are produced for incoming agent requests",
            tracker: Some("#135979501"),
            run: forwarding::cef_agent_logs_present,
        },
        Scenario {
            id: "audit-binaries",
            description: "audit logs are produced for use of specific binaries",
            tracker: Some("#137987887"),
            run: audit::binary_use_is_audited,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_ids_unique_and_kebab_case() {
        let scenarios = catalog();
        assert_eq!(scenarios.len(), 7);
        let ids: HashSet<&str> = scenarios.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), scenarios.len());
        for id in ids {
            assert!(
                id.chars().all(|c| c.is_ascii_lowercase() || c == '-'),
                "bad id {}",
                id
            );
        }
    }

    #[test]
    fn tracker_ids_are_hash_prefixed() {
        for scenario in catalog() {
            if let Some(tracker) = scenario.tracker {
                assert!(tracker.starts_with('#'), "{}", tracker);
            }
        }
    }
}
