use anyhow::Result;
use std::time::Duration;

use super::SuiteContext;

/// logrotate runs from cron once a minute after the schedule is rewritten.
const CRON_PERIOD: Duration = Duration::from_secs(60);
const ROTATION_WAIT: Duration = Duration::from_secs(62);

const FILL_SYSLOG: &str = r#"logger "old syslog content" \
	&& sudo bash -c "dd if=/dev/urandom count=10000 bs=1024 >> /var/log/syslog" \
	&& sudo sed -i "s/0,15,30,45/\*/" /etc/cron.d/logrotate"#;

/// Pushes syslog past the size threshold, makes logrotate fire every minute,
/// then checks that fresh messages land in a file without the old content.
pub fn syslog_rotates_at_threshold(ctx: &SuiteContext) -> Result<()> {
    let forwarder = &ctx.instances.forwarder;
    let root_log = &ctx.paths.root_log_syslog;

    ctx.ssh_ok(forwarder, FILL_SYSLOG, "Could not fill syslog past the rotation threshold")?;

    // Before the first cron tick every check below already passes.
    ctx.waiter.settle_after(CRON_PERIOD, ROTATION_WAIT, || {
        ctx.ssh_ok(
            forwarder,
            r#"logger "new syslog content""#,
            "Could not log 'new syslog content'",
        )?;
        ctx.ssh_ok(
            forwarder,
            &format!("sudo grep 'new syslog content' {}", root_log),
            "Syslog did not contain 'new syslog content'!",
        )?;
        ctx.ssh_ok(
            forwarder,
            &format!("sudo grep -vl 'old syslog content' {}", root_log),
            "Syslog contains content 'old syslog content' that should have been rotated!",
        )?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect::is_assertion;
    use crate::scenarios::fixture::{context, ssh};
    use crate::testutil::{default_config, instant_waiter, recording_waiter, FakeRunner};
    use crate::wait::WaitStrategy;

    #[test]
    fn rotation_commands() {
        let runner = FakeRunner::new();
        let config = default_config();
        let waiter = instant_waiter(WaitStrategy::Fixed);
        syslog_rotates_at_threshold(&context(&runner, &config, &waiter)).unwrap();

        let calls = runner.arg_lists();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], ssh("syslog_forwarder/0", FILL_SYSLOG));
        assert_eq!(
            calls[1],
            ssh("syslog_forwarder/0", r#"logger "new syslog content""#)
        );
        assert_eq!(
            calls[2],
            ssh(
                "syslog_forwarder/0",
                "sudo grep 'new syslog content' /var/vcap/data/root_log/syslog"
            )
        );
        assert_eq!(
            calls[3],
            ssh(
                "syslog_forwarder/0",
                "sudo grep -vl 'old syslog content' /var/vcap/data/root_log/syslog"
            )
        );
    }

    #[test]
    fn fill_command_keeps_shell_operators() {
        assert!(FILL_SYSLOG.contains("&& sudo bash -c"));
        assert!(FILL_SYSLOG.contains(r"s/0,15,30,45/\*/"));
        assert!(FILL_SYSLOG.contains(">> /var/log/syslog"));
    }

    #[test]
    fn unrotated_log_fails_with_rotation_message() {
        let runner = FakeRunner::new().respond("grep -vl", FakeRunner::exit(1, "", ""));
        let config = default_config();
        let waiter = instant_waiter(WaitStrategy::Fixed);
        let err = syslog_rotates_at_threshold(&context(&runner, &config, &waiter)).unwrap_err();

        assert!(is_assertion(&err));
        assert!(err
            .to_string()
            .contains("'old syslog content' that should have been rotated!"));
    }

    #[test]
    fn poll_repeats_whole_verification() {
        let runner = FakeRunner::new().respond_times("grep -vl", 1, FakeRunner::exit(1, "", ""));
        let config = default_config();
        let waiter = instant_waiter(WaitStrategy::Poll);
        syslog_rotates_at_threshold(&context(&runner, &config, &waiter)).unwrap();

        // fill, then two rounds of logger/grep/grep -vl
        assert_eq!(runner.calls().len(), 7);
    }

    #[test]
    fn poll_waits_for_cron_before_verifying() {
        let runner = FakeRunner::new();
        let config = default_config();
        let (waiter, slept) = recording_waiter(WaitStrategy::Poll);
        syslog_rotates_at_threshold(&context(&runner, &config, &waiter)).unwrap();

        let total: Duration = slept.borrow().iter().sum();
        assert!(total >= Duration::from_secs(60), "slept only {:?}", total);
        assert_eq!(runner.calls().len(), 4);
    }

    #[test]
    fn fixed_waits_full_rotation_delay() {
        let runner = FakeRunner::new();
        let config = default_config();
        let (waiter, slept) = recording_waiter(WaitStrategy::Fixed);
        syslog_rotates_at_threshold(&context(&runner, &config, &waiter)).unwrap();

        assert_eq!(*slept.borrow(), vec![Duration::from_secs(62)]);
    }

    #[test]
    fn fill_failure_skips_wait() {
        let runner = FakeRunner::new().fail("dd if=/dev/urandom", "failed to run bosh");
        let config = default_config();
        let waiter = instant_waiter(WaitStrategy::Fixed);
        let err = syslog_rotates_at_threshold(&context(&runner, &config, &waiter)).unwrap_err();

        assert!(!is_assertion(&err));
        assert_eq!(runner.calls().len(), 1);
    }
}
