//! Verification attempt throttling.
//!
//! Tracks consecutive failed verification attempts for a device and computes
//! whether a new attempt is currently permitted. The required spacing between
//! attempts doubles with every consecutive failure and is scaled by a
//! configurable factor, so deployments can tune strictness without changing
//! the algorithm.
//!
//! The guard itself performs no I/O: the state lives on the device record and
//! the caller is responsible for persisting it after a mutation.
//!
//! # Example
//!
//! ```rust,ignore
//! use dialback::throttle::{ThrottleGuard, ThrottleState};
//! use std::time::SystemTime;
//!
//! let guard = ThrottleGuard::new(1);
//! let mut state = ThrottleState::default();
//!
//! let now = SystemTime::now();
//! assert!(guard.is_attempt_allowed(&state, now));
//!
//! guard.record_failure(&mut state, now);
//! if let Some(wait) = guard.retry_after(&state, now) {
//!     println!("Wait {} seconds before retrying", wait.as_secs());
//! }
//! ```

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Cap on the backoff exponent. 2^20 seconds is roughly twelve days; a
/// device hammered beyond that point must not overflow the shift.
const MAX_BACKOFF_EXPONENT: u32 = 20;

/// Consecutive-failure state for a single device.
///
/// Mutated only through [`ThrottleGuard::record_failure`] and
/// [`ThrottleGuard::record_success`]; the count never goes negative and only
/// resets through an explicit success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrottleState {
    /// Number of consecutive failed attempts.
    pub failure_count: u32,
    /// When the last failed attempt occurred.
    pub last_attempt_at: Option<SystemTime>,
}

impl ThrottleState {
    /// A fresh state with no recorded failures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Computes throttling decisions from a [`ThrottleState`].
#[derive(Debug, Clone, Copy)]
pub struct ThrottleGuard {
    factor: u32,
}

impl Default for ThrottleGuard {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ThrottleGuard {
    /// Create a guard with the given throttle factor.
    ///
    /// The factor scales how aggressively backoff grows; it is clamped to a
    /// minimum of 1.
    #[must_use]
    pub fn new(factor: u32) -> Self {
        Self {
            factor: factor.max(1),
        }
    }

    /// The minimum spacing required after `failure_count` consecutive
    /// failures: `factor * 2^(failure_count - 1)` seconds.
    ///
    /// Non-decreasing in the failure count. Zero failures require no spacing.
    #[must_use]
    pub fn required_spacing(&self, failure_count: u32) -> Duration {
        if failure_count == 0 {
            return Duration::ZERO;
        }
        let exponent = (failure_count - 1).min(MAX_BACKOFF_EXPONENT);
        Duration::from_secs(u64::from(self.factor) << exponent)
    }

    /// Whether a new attempt is permitted at `now`.
    ///
    /// A state with zero failures is always allowed. Otherwise the elapsed
    /// time since the last attempt must be at least the required spacing.
    #[must_use]
    pub fn is_attempt_allowed(&self, state: &ThrottleState, now: SystemTime) -> bool {
        self.retry_after(state, now).is_none()
    }

    /// Time remaining until the next attempt is permitted, or `None` if an
    /// attempt is allowed right now.
    #[must_use]
    pub fn retry_after(&self, state: &ThrottleState, now: SystemTime) -> Option<Duration> {
        if state.failure_count == 0 {
            return None;
        }
        let last = state.last_attempt_at?;
        let elapsed = now.duration_since(last).unwrap_or(Duration::ZERO);
        let required = self.required_spacing(state.failure_count);

        required.checked_sub(elapsed).filter(|r| !r.is_zero())
    }

    /// Record a failed attempt.
    pub fn record_failure(&self, state: &mut ThrottleState, now: SystemTime) {
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_attempt_at = Some(now);
    }

    /// Record a successful attempt, clearing all failure history.
    pub fn record_success(&self, state: &mut ThrottleState) {
        state.failure_count = 0;
        state.last_attempt_at = None;
    }
}
