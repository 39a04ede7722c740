//! Dialback - phone-backed one-time-password verification
//!
//! Dialback provides the core pieces for confirming that a user holds a
//! phone-linked secret: RFC 6238 code generation and drift-tolerant
//! verification, exponential attempt throttling, and transparent encryption
//! of the stored phone number. Delivery (SMS/voice) and persistence are
//! pluggable seams, not opinions.
//!
//! # Features
//!
//! - **TOTP**: 30-second steps, configurable digits, backward-only drift
//!   window so stale codes are tolerated but future codes never are
//! - **Throttling**: spacing between attempts doubles with every
//!   consecutive failure, scaled by a configurable factor
//! - **Field encryption**: AES-256-GCM for the number at rest; corrupted or
//!   re-keyed ciphertext reads back as empty instead of erroring
//! - **Delivery**: a small async [`Gateway`] trait, selected per device by
//!   [`DeliveryMethod`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dialback::{
//!     ConsoleGateway, DeliveryMethod, PhoneDevice, PhoneVerifier, VerifyConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> dialback::Result<()> {
//!     dialback::init_tracing();
//!
//!     let verifier = PhoneVerifier::new(VerifyConfig::default());
//!     let mut device = PhoneDevice::new("+441234567890", DeliveryMethod::Sms)?;
//!
//!     // Send the current code to the user...
//!     let gateway = ConsoleGateway::new();
//!     verifier.generate_challenge(&device, &gateway).await?;
//!
//!     // ...and verify what they type back.
//!     let outcome = verifier.verify(&mut device, "492039");
//!     println!("verified: {}", outcome.is_verified());
//!     Ok(())
//! }
//! ```

pub mod codec;
mod config;
pub mod device;
mod error;
pub mod throttle;
pub mod totp;
pub mod utils;
pub mod validation;

// Re-exports for public API
pub use codec::FieldCipher;
pub use config::{VerifyConfig, VerifyConfigBuilder};
pub use device::{
    Challenge, ConsoleGateway, DeliveryMethod, DeviceRecord, DeviceStore, Gateway,
    MemoryDeviceStore, PhoneDevice, PhoneVerifier, RecordingGateway, Verification,
};
pub use error::{DialbackError, Result};
pub use throttle::{ThrottleGuard, ThrottleState};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main().
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "dialback=debug")
/// - `DIALBACK_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("DIALBACK_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
