use anyhow::Result;

use super::SuiteContext;

pub fn modprobe_is_forwarded(ctx: &SuiteContext) -> Result<()> {
    ctx.ssh_ok(
        &ctx.instances.forwarder,
        "sudo modprobe -r floppy",
        "Could not run 'sudo modprobe -r floppy'",
    )?;
    ctx.storer_has("COMMAND=/sbin/modprobe -r floppy", false)
}

pub fn binary_use_is_audited(ctx: &SuiteContext) -> Result<()> {
    ctx.ssh_ok(
        &ctx.instances.forwarder,
        "chage -h",
        "Unable to run 'chage -h'",
    )?;
    ctx.storer_has(r#"exe="/usr/bin/chage""#, true)
}
