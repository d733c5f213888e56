use anyhow::Result;
use std::time::Duration;

use super::SuiteContext;
use crate::bosh::remote_path;
use crate::staging::StagedFile;

const NESTED_LOG_MESSAGE: &str = "test-blackbox-message";
const NESTED_LOG_PROPAGATION: Duration = Duration::from_secs(35);
const CEF_GET_TASK: &str = "CEF:0|CloudFoundry|BOSH|1|agent_api|get_task";

pub fn syslog_message_is_forwarded(ctx: &SuiteContext) -> Result<()> {
    ctx.ssh_ok(
        &ctx.instances.forwarder,
        "logger -t vcap some vcap message",
        "Could not log to syslog",
    )?;
    ctx.storer_has("some vcap message", false)
}

/// Files dropped under the job log tree are picked up at any depth.
pub fn nested_log_is_forwarded(ctx: &SuiteContext) -> Result<()> {
    let staged = StagedFile::with_contents("logfile", NESTED_LOG_MESSAGE.as_bytes())?;
    let dir = &ctx.paths.nested_log_dir;

    ctx.ssh_ok(
        &ctx.instances.forwarder,
        &format!("sudo mkdir -p {dir} && sudo chmod 777 {dir}"),
        "Could not create nested log path!",
    )?;

    let target = format!("{}/deepfile.log", dir);
    ctx.scp_ok(
        staged.arg()?,
        &remote_path(&ctx.instances.forwarder, &target),
        &format!("Could not scp to {}", target),
    )?;

    ctx.waiter
        .settle(NESTED_LOG_PROPAGATION, || ctx.storer_has(NESTED_LOG_MESSAGE, true))
}

pub fn cef_agent_logs_present(ctx: &SuiteContext) -> Result<()> {
    ctx.storer_has(CEF_GET_TASK, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect::is_assertion;
    use crate::scenarios::fixture::{context, scp, ssh};
    use crate::testutil::{default_config, instant_waiter, FakeRunner};
    use crate::wait::WaitStrategy;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn syslog_forwarding_commands() {
        let runner = FakeRunner::new();
        let config = default_config();
        let waiter = instant_waiter(WaitStrategy::Fixed);
        syslog_message_is_forwarded(&context(&runner, &config, &waiter)).unwrap();

        assert_eq!(
            runner.arg_lists(),
            vec![
                ssh("syslog_forwarder/0", "logger -t vcap some vcap message"),
                ssh(
                    "syslog_storer/0",
                    "grep 'some vcap message' /var/vcap/store/syslog_storer/syslog.log"
                ),
            ]
        );
    }

    #[test]
    fn nested_log_uploads_staged_file() {
        let uploaded = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&uploaded);
        let runner = FakeRunner::new().respond_with("scp", move |spec| {
            // args: -d <deployment> scp <source> <destination>
            let contents = std::fs::read(&spec.args[3])?;
            *sink.borrow_mut() = contents;
            Ok(FakeRunner::exit(0, "", ""))
        });
        let config = default_config();
        let waiter = instant_waiter(WaitStrategy::Fixed);
        nested_log_is_forwarded(&context(&runner, &config, &waiter)).unwrap();

        assert_eq!(*uploaded.borrow(), b"test-blackbox-message".to_vec());

        let calls = runner.arg_lists();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0],
            ssh(
                "syslog_forwarder/0",
                "sudo mkdir -p /var/vcap/sys/log/deep/path && sudo chmod 777 /var/vcap/sys/log/deep/path"
            )
        );
        let source = &calls[1][3];
        assert!(std::path::Path::new(source).is_absolute(), "{}", source);
        assert_eq!(
            calls[1],
            scp(
                source,
                "syslog_forwarder/0:/var/vcap/sys/log/deep/path/deepfile.log"
            )
        );
        assert_eq!(
            calls[2],
            ssh(
                "syslog_storer/0",
                "sudo grep 'test-blackbox-message' /var/vcap/store/syslog_storer/syslog.log"
            )
        );
    }

    #[test]
    fn nested_log_polls_until_message_arrives() {
        let runner = FakeRunner::new().respond_times(
            "test-blackbox-message",
            2,
            FakeRunner::exit(1, "", ""),
        );
        let config = default_config();
        let waiter = instant_waiter(WaitStrategy::Poll);
        nested_log_is_forwarded(&context(&runner, &config, &waiter)).unwrap();

        // mkdir, scp, then three greps
        assert_eq!(runner.calls().len(), 5);
    }

    #[test]
    fn nested_log_fixed_wait_verifies_once() {
        let runner =
            FakeRunner::new().respond("test-blackbox-message", FakeRunner::exit(1, "", ""));
        let config = default_config();
        let waiter = instant_waiter(WaitStrategy::Fixed);
        let err = nested_log_is_forwarded(&context(&runner, &config, &waiter)).unwrap_err();

        assert!(is_assertion(&err));
        assert!(err.to_string().contains("Syslog did not contain 'test-blackbox-message'!"));
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn scp_failure_reports_target() {
        let runner = FakeRunner::new().respond("scp", FakeRunner::exit(1, "", "permission denied"));
        let config = default_config();
        let waiter = instant_waiter(WaitStrategy::Fixed);
        let err = nested_log_is_forwarded(&context(&runner, &config, &waiter)).unwrap_err();

        let msg = err.to_string();
        assert!(
            msg.contains("Could not scp to /var/vcap/sys/log/deep/path/deepfile.log"),
            "{}",
            msg
        );
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn cef_grep_is_passed_verbatim() {
        let runner = FakeRunner::new();
        let config = default_config();
        let waiter = instant_waiter(WaitStrategy::Fixed);
        cef_agent_logs_present(&context(&runner, &config, &waiter)).unwrap();

        assert_eq!(
            runner.arg_lists(),
            vec![ssh(
                "syslog_storer/0",
                "sudo grep 'CEF:0|CloudFoundry|BOSH|1|agent_api|get_task' /var/vcap/store/syslog_storer/syslog.log"
            )]
        );
    }
}
