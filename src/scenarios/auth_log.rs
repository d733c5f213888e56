use anyhow::Result;

use super::SuiteContext;
use crate::bosh::remote_path;
use crate::expect::expect_not_contains;
use crate::staging::StagedFile;

const REMOTE_COPY: &str = "/tmp/auth.log";

pub fn auth_log_has_no_missing_file_errors(ctx: &SuiteContext) -> Result<()> {
    let staged = StagedFile::empty("auth.log")?;

    ctx.ssh_ok(
        &ctx.instances.forwarder,
        "sudo cp /var/log/auth.log /tmp/ && sudo chmod 777 /tmp/auth.log",
        "Could not copy /var/log/auth.log to /tmp!",
    )?;
    ctx.scp_ok(
        &remote_path(&ctx.instances.forwarder, REMOTE_COPY),
        staged.arg()?,
        "Could not download /var/log/auth.log",
    )?;

    let contents = staged.read_contents()?;
    expect_not_contains(&contents, "No such file or directory", "auth.log")
}
