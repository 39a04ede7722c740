//! TOTP (Time-based One-Time Password) generation and verification.
//!
//! Implements RFC 6238 over HMAC-SHA1 with a fixed 30-second time step.
//! Verification tolerates clock drift by checking a bounded number of time
//! steps *behind* the current one; a code for a future step never validates.
//! This keeps delivery and typing latency covered without accepting codes
//! that are not yet valid.
//!
//! All functions here are pure: time is an explicit parameter, nothing is
//! cached, and concurrent calls with the same secret are safe.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

type HmacSha1 = Hmac<Sha1>;

/// TOTP time step in seconds (RFC 6238 default).
pub const STEP_SECONDS: u64 = 30;

/// Generate the code for the time step containing `at`.
///
/// The code is rendered as text, left-padded with zeros to `digits` length.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, UNIX_EPOCH};
/// use dialback::totp::current_code;
///
/// let code = current_code(b"12345678901234567890", 6, UNIX_EPOCH + Duration::from_secs(59));
/// assert_eq!(code, "287082");
/// ```
pub fn current_code(secret: &[u8], digits: u32, at: SystemTime) -> String {
    let code = hotp(secret, time_step(at), digits);
    format!("{:0width$}", code, width = digits as usize)
}

/// Check a candidate code against the drift window ending at `at`.
///
/// The window covers the current time step and up to `drift_steps` steps in
/// the past. A candidate that does not parse as a non-negative integer is
/// rejected outright; this is a normal rejection, not an error.
pub fn is_valid(secret: &[u8], candidate: &str, digits: u32, at: SystemTime, drift_steps: u64) -> bool {
    let candidate = match candidate.trim().parse::<u32>() {
        Ok(value) => value,
        Err(_) => return false,
    };

    let current = time_step(at);
    for back in 0..=drift_steps {
        let step = match current.checked_sub(back) {
            Some(step) => step,
            None => break,
        };
        if bool::from(hotp(secret, step, digits).ct_eq(&candidate)) {
            return true;
        }
    }

    false
}

fn time_step(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() / STEP_SECONDS)
        .unwrap_or(0)
}

/// HOTP value for a single counter (RFC 4226 dynamic truncation).
fn hotp(secret: &[u8], counter: u64, digits: u32) -> u32 {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);

    binary % 10_u32.pow(digits)
}
