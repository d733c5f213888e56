use anyhow::Result;

use crate::runner::CommandResult;

/// A check on a completed command that did not hold. Kept separate from
/// execution errors so the suite can classify failures.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct AssertionError {
    pub message: String,
}

impl AssertionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn is_assertion(err: &anyhow::Error) -> bool {
    err.downcast_ref::<AssertionError>().is_some()
}

/// Fails unless the command exited 0. The captured streams are appended to
/// `message` for diagnosis.
pub fn expect_success(result: &CommandResult, message: &str) -> Result<()> {
    if result.success() {
        return Ok(());
    }
    Err(AssertionError::new(format!(
        "{}\n exit status: {}\n stdOut: {}\n stdErr: {}",
        message,
        result.exit_status,
        result.stdout_lossy(),
        result.stderr_lossy()
    ))
    .into())
}

pub fn expect_not_contains(haystack: &[u8], needle: &str, what: &str) -> Result<()> {
    let found = !needle.is_empty()
        && haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes());
    if found {
        return Err(AssertionError::new(format!(
            "{} should not contain {:?}\n contents: {}",
            what,
            needle,
            String::from_utf8_lossy(haystack)
        ))
        .into());
    }
    Ok(())
}
