//! Phone-linked devices and verification orchestration.
//!
//! A [`PhoneDevice`] ties together a per-device secret, a phone number, a
//! delivery method, and throttle state. [`PhoneVerifier`] orchestrates the
//! pure pieces: the throttle guard gates every attempt, the TOTP check runs
//! only when an attempt is allowed, and the outcome is recorded back into
//! the device's throttle state.
//!
//! # Example
//!
//! ```rust,ignore
//! use dialback::{DeliveryMethod, PhoneDevice, PhoneVerifier, VerifyConfig};
//!
//! let mut device = PhoneDevice::new("+441234567890", DeliveryMethod::Sms)?;
//! let verifier = PhoneVerifier::new(VerifyConfig::default());
//!
//! // Send the current code to the user...
//! verifier.generate_challenge(&device, &gateway).await?;
//!
//! // ...then check what they typed.
//! let outcome = verifier.verify(&mut device, "492039");
//! if outcome.is_verified() {
//!     println!("Phone confirmed");
//! }
//! ```

mod gateway;
mod storage;
mod verifier;

pub use gateway::{ConsoleGateway, Gateway, RecordingGateway};
pub use storage::{DeviceStore, MemoryDeviceStore};
pub use verifier::{Challenge, PhoneVerifier, Verification};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::FieldCipher;
use crate::error::Result;
use crate::throttle::ThrottleState;
use crate::validation::validate_phone;

/// Secret key length in bytes (40 hex characters when encoded).
const KEY_BYTES: usize = 20;

/// How a one-time code reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    /// Voice call
    Call,
    /// Text message
    Sms,
}

impl DeliveryMethod {
    /// Returns the method name for display and logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Sms => "sms",
        }
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A phone number and token seed linked to a user.
///
/// The secret key is generated once at creation and never regenerated;
/// changing it would invalidate every previously issued code. Throttle state
/// is mutated by [`PhoneVerifier`] on each attempt and persisted by the
/// caller.
#[derive(Debug, Clone)]
pub struct PhoneDevice {
    /// Identity, absent until first persisted. A device without an id is
    /// still being enrolled and is exempt from throttling.
    pub id: Option<Uuid>,
    /// Hex-encoded secret key, the HMAC key for code generation.
    key: String,
    /// The phone number in its logical (plaintext) form.
    pub number: String,
    /// Which delivery collaborator receives generated codes.
    pub method: DeliveryMethod,
    /// Consecutive-failure tracking for this device.
    pub throttle: ThrottleState,
}

impl PhoneDevice {
    /// Create a device with a fresh random secret and zeroed throttle state.
    ///
    /// # Errors
    ///
    /// Returns an error if the phone number is not valid.
    pub fn new(number: impl Into<String>, method: DeliveryMethod) -> Result<Self> {
        let number = number.into();
        validate_phone(&number)?;

        Ok(Self {
            id: None,
            key: random_hex_key(),
            number,
            method,
            throttle: ThrottleState::new(),
        })
    }

    /// Whether this device has been persisted (has an identity).
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// The hex-encoded secret key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The secret key as raw bytes.
    #[must_use]
    pub fn bin_key(&self) -> Vec<u8> {
        hex::decode(&self.key).unwrap_or_default()
    }

    /// Convert to the stored representation, encrypting the phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    pub fn to_record(&self, cipher: &FieldCipher) -> Result<DeviceRecord> {
        let number = if self.number.is_empty() {
            String::new()
        } else {
            cipher.encrypt(&self.number)?
        };

        Ok(DeviceRecord {
            id: self.id,
            key: self.key.clone(),
            number,
            method: self.method,
            throttle: self.throttle.clone(),
        })
    }

    /// Rebuild a device from its stored representation, decrypting the phone
    /// number.
    ///
    /// A number that fails to decrypt (key rotation, corrupted blob) comes
    /// back empty rather than failing the read path.
    #[must_use]
    pub fn from_record(record: DeviceRecord, cipher: &FieldCipher) -> Self {
        Self {
            id: record.id,
            key: record.key,
            number: cipher.decrypt(&record.number),
            method: record.method,
            throttle: record.throttle,
        }
    }
}

/// The opaque stored shape of a [`PhoneDevice`].
///
/// The `number` field holds the ciphertext blob (or the empty string when no
/// number is on file); nothing should log or compare it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: Option<Uuid>,
    pub key: String,
    pub number: String,
    pub method: DeliveryMethod,
    pub throttle: ThrottleState,
}

fn random_hex_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_device_has_fresh_state() {
        let device = PhoneDevice::new("+441234567890", DeliveryMethod::Sms).unwrap();

        assert!(device.id.is_none());
        assert!(!device.is_persisted());
        assert_eq!(device.key().len(), 40);
        assert_eq!(device.bin_key().len(), 20);
        assert_eq!(device.throttle.failure_count, 0);
    }

    #[test]
    fn test_new_device_keys_are_unique() {
        let a = PhoneDevice::new("+441234567890", DeliveryMethod::Sms).unwrap();
        let b = PhoneDevice::new("+441234567890", DeliveryMethod::Sms).unwrap();
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_invalid_number_rejected() {
        assert!(PhoneDevice::new("nope", DeliveryMethod::Call).is_err());
    }

    #[test]
    fn test_record_roundtrip() {
        let cipher = FieldCipher::new(
            "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef",
        )
        .unwrap();

        let mut device = PhoneDevice::new("+441234567890", DeliveryMethod::Call).unwrap();
        device.id = Some(Uuid::new_v4());

        let record = device.to_record(&cipher).unwrap();
        assert_ne!(record.number, device.number);
        assert!(!record.number.contains("1234567890"));

        let restored = PhoneDevice::from_record(record, &cipher);
        assert_eq!(restored.id, device.id);
        assert_eq!(restored.key(), device.key());
        assert_eq!(restored.number, "+441234567890");
        assert_eq!(restored.method, DeliveryMethod::Call);
    }

    #[test]
    fn test_record_with_wrong_key_reads_empty_number() {
        let cipher = FieldCipher::new(
            "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef",
        )
        .unwrap();
        let rotated = FieldCipher::new(
            "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210",
        )
        .unwrap();

        let device = PhoneDevice::new("+441234567890", DeliveryMethod::Sms).unwrap();
        let record = device.to_record(&cipher).unwrap();

        let restored = PhoneDevice::from_record(record, &rotated);
        assert_eq!(restored.number, "");
        // The secret survives; only the protected field degrades.
        assert_eq!(restored.key(), device.key());
    }

    #[test]
    fn test_delivery_method_display() {
        assert_eq!(DeliveryMethod::Call.to_string(), "call");
        assert_eq!(DeliveryMethod::Sms.to_string(), "sms");
    }
}
