//! External link verification
//!
//! Provides:
//! - A transport trait with a reqwest implementation (HEAD, GET fallback)
//! - A bounded retry policy for transient failures
//! - A per-host throttle
//! - Concurrent batch checks with verdict-change tracking

mod checker;
mod prober;
mod retry;
mod throttle;

pub use checker::LinkVerifier;
pub use prober::{HttpProber, LinkProber, ProbeError};
pub use retry::{ProbeReport, RetryPolicy, RetrySchedule};
pub use throttle::{host_of, throttle_key, HostThrottle};

use linkforge_common::domain::ExternalLinkFilter;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Liveness verdict of one link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Broken,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Valid => "valid",
            Verdict::Broken => "broken",
        }
    }
}

/// Verdict compared with the previous verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictChange {
    NewlyBroken,
    StillBroken,
    StillValid,
    Recovered,
}

impl VerdictChange {
    /// Never-verified links count as previously valid
    pub fn between(was_broken: bool, verdict: Verdict) -> Self {
        match (was_broken, verdict) {
            (false, Verdict::Broken) => VerdictChange::NewlyBroken,
            (true, Verdict::Broken) => VerdictChange::StillBroken,
            (false, Verdict::Valid) => VerdictChange::StillValid,
            (true, Verdict::Valid) => VerdictChange::Recovered,
        }
    }
}

/// Result of checking one link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkCheck {
    pub link_id: Uuid,
    pub article_id: Uuid,
    pub url: String,
    pub verdict: Verdict,
    pub change: VerdictChange,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub attempts: u32,
    /// False when writing the verdict back failed
    pub persisted: bool,
}

/// What a verification pass should check
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub filter: ExternalLinkFilter,
    /// Overrides the configured concurrency
    pub concurrency: Option<usize>,
    /// Restrict the pass to links currently flagged broken
    #[serde(default)]
    pub only_broken: bool,
}

/// Aggregate of a verification pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub checked: usize,
    pub valid: usize,
    pub broken: usize,
    pub newly_broken: usize,
    pub still_broken: usize,
    pub recovered: usize,
    /// Links not checked because the run was cancelled
    pub skipped: usize,
    pub write_failures: usize,
    pub elapsed_ms: u64,
    /// Ordered by link id
    pub results: Vec<LinkCheck>,
}

impl VerificationSummary {
    pub(crate) fn record(&mut self, check: LinkCheck) {
        self.checked += 1;
        match check.verdict {
            Verdict::Valid => self.valid += 1,
            Verdict::Broken => self.broken += 1,
        }
        match check.change {
            VerdictChange::NewlyBroken => self.newly_broken += 1,
            VerdictChange::StillBroken => self.still_broken += 1,
            VerdictChange::Recovered => self.recovered += 1,
            VerdictChange::StillValid => {}
        }
        if !check.persisted {
            self.write_failures += 1;
        }
        self.results.push(check);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_change() {
        assert_eq!(VerdictChange::between(false, Verdict::Broken), VerdictChange::NewlyBroken);
        assert_eq!(VerdictChange::between(true, Verdict::Broken), VerdictChange::StillBroken);
        assert_eq!(VerdictChange::between(false, Verdict::Valid), VerdictChange::StillValid);
        assert_eq!(VerdictChange::between(true, Verdict::Valid), VerdictChange::Recovered);
    }
}
