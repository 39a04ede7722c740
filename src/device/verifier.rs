//! Verification and challenge orchestration.

use std::time::{Duration, SystemTime};

use super::{DeviceStore, Gateway, PhoneDevice};
use crate::config::VerifyConfig;
use crate::error::Result;
use crate::throttle::ThrottleGuard;
use crate::totp;

/// Outcome of a verification attempt.
///
/// Callers that only care about the boolean collapse this with
/// [`is_verified`](Verification::is_verified); the throttled variant carries
/// the remaining wait for user messaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The code matched; throttle history was reset.
    Verified,
    /// The code did not match; the failure was recorded.
    Rejected,
    /// The attempt was denied before any code comparison.
    Throttled {
        /// Time until the next attempt is permitted.
        retry_after: Duration,
    },
}

impl Verification {
    /// Whether the attempt verified the device.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Outcome of a challenge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    /// The code was handed to the gateway.
    Sent,
    /// The request was denied; no code was generated or delivered.
    Throttled {
        /// Time until the next attempt is permitted.
        retry_after: Duration,
    },
}

/// Orchestrates code verification and challenge generation for phone
/// devices.
///
/// Every attempt runs the same state machine: the throttle guard decides
/// whether the attempt may proceed at all, and only then is the candidate
/// parsed and compared. A denied attempt performs no HMAC work.
///
/// Throttle mutations apply to the device's in-memory state; concurrent
/// attempts against the *same* device are not serialized here, so callers
/// that allow them must lock or use an optimistic-concurrency check around
/// the read-verify-persist sequence.
#[derive(Debug, Clone)]
pub struct PhoneVerifier {
    config: VerifyConfig,
    guard: ThrottleGuard,
}

impl PhoneVerifier {
    /// Create a verifier with the given configuration.
    #[must_use]
    pub fn new(config: VerifyConfig) -> Self {
        let guard = ThrottleGuard::new(config.throttle_factor);
        Self { config, guard }
    }

    /// The verifier's configuration.
    #[must_use]
    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Verify a candidate code against the device, using the current time.
    pub fn verify(&self, device: &mut PhoneDevice, candidate: &str) -> Verification {
        self.verify_at(device, candidate, SystemTime::now())
    }

    /// Verify a candidate code at a specific timestamp (useful for testing).
    pub fn verify_at(
        &self,
        device: &mut PhoneDevice,
        candidate: &str,
        now: SystemTime,
    ) -> Verification {
        if let Some(retry_after) = self.throttle_check(device, now) {
            tracing::debug!(
                target: "dialback.verify.throttled",
                device_id = ?device.id,
                failure_count = device.throttle.failure_count,
                retry_after_secs = retry_after.as_secs(),
                "Verification attempt blocked by throttle"
            );
            return Verification::Throttled { retry_after };
        }

        let valid = totp::is_valid(
            &device.bin_key(),
            candidate,
            self.config.digits,
            now,
            self.config.drift_steps,
        );

        if valid {
            self.guard.record_success(&mut device.throttle);
            tracing::debug!(
                target: "dialback.verify.accepted",
                device_id = ?device.id,
                "Code verified, throttle history cleared"
            );
            Verification::Verified
        } else {
            self.guard.record_failure(&mut device.throttle, now);
            tracing::debug!(
                target: "dialback.verify.rejected",
                device_id = ?device.id,
                failure_count = device.throttle.failure_count,
                "Code rejected"
            );
            Verification::Rejected
        }
    }

    /// Verify a candidate code and persist the mutated throttle state.
    ///
    /// State is committed only for a persisted device; a device still being
    /// enrolled has no durable identity to persist against, so its throttle
    /// state stays in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails to save the throttle state; the
    /// verification outcome itself never errors.
    pub async fn verify_and_commit(
        &self,
        device: &mut PhoneDevice,
        candidate: &str,
        store: &dyn DeviceStore,
    ) -> Result<Verification> {
        let outcome = self.verify(device, candidate);

        if !matches!(outcome, Verification::Throttled { .. }) {
            if let Some(id) = device.id {
                store.save_throttle(id, &device.throttle).await?;
            }
        }

        Ok(outcome)
    }

    /// Generate the current code and hand it to the gateway, using the
    /// current time.
    pub async fn generate_challenge(
        &self,
        device: &PhoneDevice,
        gateway: &dyn Gateway,
    ) -> Result<Challenge> {
        self.generate_challenge_at(device, gateway, SystemTime::now())
            .await
    }

    /// Generate a challenge at a specific timestamp (useful for testing).
    ///
    /// The throttle check runs first; a denied request generates no code and
    /// delivers nothing. On allow, the code is handed to the gateway exactly
    /// once with no retries.
    ///
    /// # Errors
    ///
    /// Propagates a gateway delivery failure.
    pub async fn generate_challenge_at(
        &self,
        device: &PhoneDevice,
        gateway: &dyn Gateway,
        now: SystemTime,
    ) -> Result<Challenge> {
        if let Some(retry_after) = self.throttle_check(device, now) {
            tracing::debug!(
                target: "dialback.challenge.throttled",
                device_id = ?device.id,
                retry_after_secs = retry_after.as_secs(),
                "Challenge request blocked by throttle"
            );
            return Ok(Challenge::Throttled { retry_after });
        }

        let code = totp::current_code(&device.bin_key(), self.config.digits, now);
        gateway.deliver(device, &code).await?;

        tracing::info!(
            target: "dialback.challenge.sent",
            device_id = ?device.id,
            method = %device.method,
            "Verification code handed to gateway"
        );

        Ok(Challenge::Sent)
    }

    /// Throttle gate shared by verification and challenge generation.
    ///
    /// A device without an id is still being enrolled, so the throttle does
    /// not apply to it.
    fn throttle_check(&self, device: &PhoneDevice, now: SystemTime) -> Option<Duration> {
        if !device.is_persisted() {
            return None;
        }
        self.guard.retry_after(&device.throttle, now)
    }
}
