//! Retry, throttle, and pacing policy for the download driver.
//!
//! The policy is deliberately simple: a fixed attempt cap with a fixed delay
//! between attempts, one run-scoped cool-down duration for throttle events,
//! and a uniform pacing range between items. Tests shrink the durations; the
//! defaults are the production values.

use std::time::Duration;

use rand::Rng;

use crate::extractor::ExtractorError;

/// Default maximum download attempts per item per run.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay between attempts on the same item.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Default cool-down armed when the service signals throttling.
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// Default bounds for the randomized inter-item pacing delay.
const DEFAULT_PACING_MIN: Duration = Duration::from_secs(2);
const DEFAULT_PACING_MAX: Duration = Duration::from_secs(5);

/// Message fragments that mark a failure as service throttling.
/// Matched case-insensitively against the whole failure text.
const THROTTLE_SIGNATURES: [&str; 5] = [
    "http error 429",
    "too many requests",
    "rate-limited",
    "rate limited",
    "try again later",
];

/// How the driver should react to a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Worth another attempt after a short delay; becomes a recorded error
    /// once the attempt cap is reached.
    Transient,
    /// The service is throttling us: no further attempts on this item, arm
    /// the run-scoped cool-down instead.
    Throttled,
}

/// Classifies a fetch failure by its message text.
///
/// Anything that does not match a throttle signature is transient — an
/// unanticipated fault in one item must never abort the whole run.
#[must_use]
pub fn classify_failure(error: &ExtractorError) -> FailureKind {
    let message = error.to_string().to_lowercase();
    if THROTTLE_SIGNATURES
        .iter()
        .any(|signature| message.contains(signature))
    {
        FailureKind::Throttled
    } else {
        FailureKind::Transient
    }
}

/// Timing policy for one download run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverPolicy {
    max_attempts: u32,
    retry_delay: Duration,
    cooldown: Duration,
    pacing_min: Duration,
    pacing_max: Duration,
}

impl DriverPolicy {
    /// Creates a policy with explicit values.
    ///
    /// `max_attempts` is clamped to at least 1; a pacing maximum below the
    /// minimum is raised to the minimum.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        retry_delay: Duration,
        cooldown: Duration,
        pacing_min: Duration,
        pacing_max: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
            cooldown,
            pacing_min,
            pacing_max: pacing_max.max(pacing_min),
        }
    }

    /// Default policy with a different attempt cap.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Maximum download attempts per item per run.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay between attempts on the same item.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Cool-down duration armed on a throttle failure.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Samples one inter-item pacing delay from the uniform range.
    #[must_use]
    pub fn pacing_delay(&self) -> Duration {
        if self.pacing_max <= self.pacing_min {
            return self.pacing_min;
        }
        rand::thread_rng().gen_range(self.pacing_min..=self.pacing_max)
    }
}

impl Default for DriverPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            cooldown: DEFAULT_COOLDOWN,
            pacing_min: DEFAULT_PACING_MIN,
            pacing_max: DEFAULT_PACING_MAX,
        }
    }
}
