//! Bounded retry policy for link probes
//!
//! The policy is a value handed to the verifier; the retry loop itself is
//! driven by `backoff::future::retry_notify`.

use super::prober::{LinkProber, ProbeError};
use backoff::backoff::Backoff;
use linkforge_common::config::VerifierConfig;
use std::time::Duration;
use tracing::debug;

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetrySchedule {
    /// Same delay before every retry
    Fixed(Duration),
    /// Delay doubles per retry up to `max`
    Exponential { initial: Duration, max: Duration },
}

/// Maximum attempts plus delay schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub schedule: RetrySchedule,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            schedule: RetrySchedule::Fixed(Duration::from_secs(1)),
        }
    }
}

impl From<&VerifierConfig> for RetryPolicy {
    fn from(config: &VerifierConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            schedule: RetrySchedule::Fixed(config.retry_delay()),
        }
    }
}

/// Outcome of a probe after retries
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub result: Result<u16, ProbeError>,
    pub attempts: u32,
}

impl RetryPolicy {
    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            schedule: RetrySchedule::Fixed(Duration::ZERO),
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay(&self, retry: u32) -> Duration {
        match self.schedule {
            RetrySchedule::Fixed(delay) => delay,
            RetrySchedule::Exponential { initial, max } => {
                let factor = 2u32.saturating_pow(retry.saturating_sub(1));
                initial.saturating_mul(factor).min(max)
            }
        }
    }

    fn backoff(&self) -> PolicyBackoff {
        PolicyBackoff {
            policy: *self,
            retries: 0,
        }
    }

    /// Probe a URL, retrying transient failures.
    ///
    /// Non-2xx statuses become `ProbeError::Status`; 429 and 5xx are
    /// retried like timeouts and connection errors, other statuses are final.
    pub async fn probe(&self, prober: &dyn LinkProber, url: &str) -> ProbeReport {
        let mut attempts = 0u32;

        let result = backoff::future::retry_notify(
            self.backoff(),
            || {
                attempts += 1;
                async move {
                    let outcome = match prober.probe(url).await {
                        Ok(status) if (200..300).contains(&status) => Ok(status),
                        Ok(status) => Err(ProbeError::Status(status)),
                        Err(err) => Err(err),
                    };
                    outcome.map_err(|err| {
                        if err.is_transient() {
                            backoff::Error::transient(err)
                        } else {
                            backoff::Error::permanent(err)
                        }
                    })
                }
            },
            |err: ProbeError, delay: Duration| {
                debug!(url = %url, error = %err, delay_ms = delay.as_millis() as u64, "Retrying link check");
            },
        )
        .await;

        ProbeReport { result, attempts }
    }
}

/// `Backoff` view of a policy; stops after `max_attempts - 1` retries
struct PolicyBackoff {
    policy: RetryPolicy,
    retries: u32,
}

impl Backoff for PolicyBackoff {
    fn reset(&mut self) {
        self.retries = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.retries + 1 >= self.policy.max_attempts {
            return None;
        }
        self.retries += 1;
        Some(self.policy.delay(self.retries))
    }
}
