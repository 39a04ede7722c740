//! Delivery gateways for one-time codes.
//!
//! A [`Gateway`] hands a generated code to whatever actually reaches the
//! user (a telephony provider, an SMS aggregator). The core calls it exactly
//! once per challenge and does not retry; retry policy belongs to the
//! implementation.

use async_trait::async_trait;

use super::PhoneDevice;
use crate::error::Result;

/// Trait for delivering one-time codes to a device's phone number.
///
/// Implementations receive the device so they can branch on
/// [`DeliveryMethod`](super::DeliveryMethod) and read the number.
///
/// # Example
///
/// ```rust,ignore
/// use dialback::{Gateway, PhoneDevice};
/// use async_trait::async_trait;
///
/// struct TwilioGateway { client: twilio::Client }
///
/// #[async_trait]
/// impl Gateway for TwilioGateway {
///     async fn deliver(&self, device: &PhoneDevice, code: &str) -> dialback::Result<()> {
///         match device.method {
///             DeliveryMethod::Sms => self.client.send_sms(&device.number, code).await,
///             DeliveryMethod::Call => self.client.place_call(&device.number, code).await,
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Deliver a code to the device's phone number.
    async fn deliver(&self, device: &PhoneDevice, code: &str) -> Result<()>;
}

/// A gateway that prints codes to stdout instead of sending them.
///
/// Useful for development when no telephony backend is wired up.
///
/// # Security Warning
///
/// **FOR DEVELOPMENT USE ONLY.** Codes are printed to stdout, which is often
/// captured by logging systems in containerized environments. The phone
/// number is redacted by default; use `with_full_number(true)` to show it in
/// local development.
#[derive(Debug, Clone, Default)]
pub struct ConsoleGateway {
    show_full_number: bool,
}

impl ConsoleGateway {
    /// Create a new console gateway with the number redacted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the full phone number in output (development only).
    #[must_use]
    pub fn with_full_number(mut self, show: bool) -> Self {
        self.show_full_number = show;
        self
    }

    fn display_number(&self, number: &str) -> String {
        if self.show_full_number {
            return number.to_string();
        }
        redact_number(number)
    }
}

#[async_trait]
impl Gateway for ConsoleGateway {
    async fn deliver(&self, device: &PhoneDevice, code: &str) -> Result<()> {
        println!(
            "[dialback] {} to {}: your verification code is {}",
            device.method,
            self.display_number(&device.number),
            code
        );
        Ok(())
    }
}

/// Keep at most the last two digits visible.
fn redact_number(number: &str) -> String {
    let visible = number.len().saturating_sub(2);
    let mut redacted = String::with_capacity(number.len());
    for (i, c) in number.chars().enumerate() {
        if i < visible && c.is_ascii_digit() {
            redacted.push('*');
        } else {
            redacted.push(c);
        }
    }
    redacted
}

/// A gateway that records deliveries instead of sending them.
///
/// Intended for tests: assert on what would have been sent.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    deliveries: std::sync::Mutex<Vec<(String, String)>>,
}

impl RecordingGateway {
    /// Create a new recording gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `(number, code)` pairs delivered so far.
    pub fn deliveries(&self) -> Vec<(String, String)> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn deliver(&self, device: &PhoneDevice, code: &str) -> Result<()> {
        self.deliveries
            .lock()
            .unwrap()
            .push((device.number.clone(), code.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeliveryMethod;

    #[test]
    fn test_redact_number() {
        assert_eq!(redact_number("+441234567890"), "+**********90");
        assert_eq!(redact_number(""), "");
        assert_eq!(redact_number("07"), "07");
    }

    #[tokio::test]
    async fn test_recording_gateway_captures_deliveries() {
        let gateway = RecordingGateway::new();
        let device = PhoneDevice::new("+441234567890", DeliveryMethod::Sms).unwrap();

        gateway.deliver(&device, "123456").await.unwrap();

        let deliveries = gateway.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0], ("+441234567890".to_string(), "123456".to_string()));
    }
}
