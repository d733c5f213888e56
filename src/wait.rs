use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::expect::is_assertion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WaitStrategy {
    /// Sleep the scenario's nominal delay, then verify once.
    Fixed,
    /// Re-run the verification until it passes or the timeout elapses.
    Poll,
}

/// Waits for remote effects (log forwarding, logrotate) to land before a
/// scenario verifies them.
pub struct Waiter {
    strategy: WaitStrategy,
    poll_interval: Duration,
    poll_timeout: Duration,
    sleep: Box<dyn Fn(Duration)>,
}

impl Waiter {
    pub fn new(strategy: WaitStrategy, poll_interval: Duration, poll_timeout: Duration) -> Self {
        Self::with_sleeper(strategy, poll_interval, poll_timeout, std::thread::sleep)
    }

    pub fn with_sleeper(
        strategy: WaitStrategy,
        poll_interval: Duration,
        poll_timeout: Duration,
        sleep: impl Fn(Duration) + 'static,
    ) -> Self {
        debug_assert!(!poll_interval.is_zero(), "poll interval must be positive");
        Self {
            strategy,
            poll_interval,
            poll_timeout,
            sleep: Box::new(sleep),
        }
    }

    pub fn strategy(&self) -> WaitStrategy {
        self.strategy
    }

    /// Runs `verify` once the remote side has had time to catch up.
    ///
    /// With [`WaitStrategy::Fixed`] this sleeps `nominal` and calls `verify`
    /// exactly once. With [`WaitStrategy::Poll`] it calls `verify` right away
    /// and retries assertion failures every poll interval until the poll
    /// timeout; execution errors are returned immediately.
    pub fn settle<F>(&self, nominal: Duration, verify: F) -> Result<()>
    where
        F: FnMut() -> Result<()>,
    {
        self.settle_after(Duration::ZERO, nominal, verify)
    }

    /// Like [`Waiter::settle`], but no verification runs before `min` has
    /// passed in either strategy. The poll timeout starts after `min`.
    pub fn settle_after<F>(&self, min: Duration, nominal: Duration, mut verify: F) -> Result<()>
    where
        F: FnMut() -> Result<()>,
    {
        match self.strategy {
            WaitStrategy::Fixed => {
                let delay = nominal.max(min);
                tracing::info!(secs = delay.as_secs(), "waiting for remote propagation");
                (self.sleep)(delay);
                verify()
            }
            WaitStrategy::Poll => {
                if !min.is_zero() {
                    tracing::info!(secs = min.as_secs(), "waiting before first verification");
                    (self.sleep)(min);
                }
                self.poll(&mut verify)
            }
        }
    }

    fn poll<F>(&self, verify: &mut F) -> Result<()>
    where
        F: FnMut() -> Result<()>,
    {
        let mut waited = Duration::ZERO;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let started = Instant::now();
            let outcome = verify();
            waited += started.elapsed();

            match outcome {
                Ok(()) => {
                    tracing::info!(attempts, "verification passed");
                    return Ok(());
                }
                Err(e) if !is_assertion(&e) => return Err(e),
                Err(e) if waited >= self.poll_timeout => {
                    return Err(e).with_context(|| {
                        format!(
                            "still failing after {} attempts over {}s",
                            attempts,
                            waited.as_secs()
                        )
                    });
                }
                Err(e) => {
                    tracing::debug!(attempts, error = %e, "verification not yet passing");
                    (self.sleep)(self.poll_interval);
                    waited += self.poll_interval;
                }
            }
        }
    }
}
