//! Device storage trait.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::DeviceRecord;
use crate::error::{DialbackError, Result};
use crate::throttle::ThrottleState;

/// Trait for persisting device records.
///
/// Implement this for your database layer. Records carry the encrypted
/// phone number; apply [`FieldCipher`](crate::FieldCipher) at this boundary
/// and nowhere else.
///
/// # Example
///
/// ```rust,ignore
/// use dialback::{DeviceRecord, DeviceStore};
/// use async_trait::async_trait;
///
/// struct SqlDeviceStore {
///     pool: sqlx::PgPool,
/// }
///
/// #[async_trait]
/// impl DeviceStore for SqlDeviceStore {
///     async fn load(&self, id: Uuid) -> Result<Option<DeviceRecord>> {
///         // Query your database
///     }
///
///     // ... implement other methods
/// }
/// ```
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Load a device record by id.
    async fn load(&self, id: Uuid) -> Result<Option<DeviceRecord>>;

    /// Save a device record.
    async fn save(&self, record: &DeviceRecord) -> Result<()>;

    /// Save only the throttle state for a device.
    ///
    /// Called after every committed verification attempt; kept separate so
    /// implementations can avoid rewriting the whole record.
    async fn save_throttle(&self, id: Uuid, state: &ThrottleState) -> Result<()>;
}

/// In-memory device store for tests and development.
#[derive(Default)]
pub struct MemoryDeviceStore {
    records: RwLock<HashMap<Uuid, DeviceRecord>>,
}

impl MemoryDeviceStore {
    /// Create a new in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeviceStore for MemoryDeviceStore {
    async fn load(&self, id: Uuid) -> Result<Option<DeviceRecord>> {
        Ok(self.records.read().unwrap().get(&id).cloned())
    }

    async fn save(&self, record: &DeviceRecord) -> Result<()> {
        let id = record
            .id
            .ok_or_else(|| DialbackError::storage("Cannot save a record without an id"))?;
        self.records.write().unwrap().insert(id, record.clone());
        Ok(())
    }

    async fn save_throttle(&self, id: Uuid, state: &ThrottleState) -> Result<()> {
        let mut records = self.records.write().unwrap();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| DialbackError::storage(format!("Unknown device: {}", id)))?;
        record.throttle = state.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::FieldCipher;
    use crate::device::{DeliveryMethod, PhoneDevice};

    fn cipher() -> FieldCipher {
        FieldCipher::new("0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef")
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = MemoryDeviceStore::new();
        let mut device = PhoneDevice::new("+441234567890", DeliveryMethod::Sms).unwrap();
        device.id = Some(Uuid::new_v4());

        let record = device.to_record(&cipher()).unwrap();
        store.save(&record).await.unwrap();

        let loaded = store.load(device.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded.key, device.key());

        assert!(store.load(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_without_id_rejected() {
        let store = MemoryDeviceStore::new();
        let device = PhoneDevice::new("+441234567890", DeliveryMethod::Sms).unwrap();
        let record = device.to_record(&cipher()).unwrap();

        assert!(store.save(&record).await.is_err());
    }

    #[tokio::test]
    async fn test_save_throttle_updates_record() {
        let store = MemoryDeviceStore::new();
        let mut device = PhoneDevice::new("+441234567890", DeliveryMethod::Sms).unwrap();
        device.id = Some(Uuid::new_v4());
        store.save(&device.to_record(&cipher()).unwrap()).await.unwrap();

        let state = ThrottleState {
            failure_count: 3,
            last_attempt_at: Some(std::time::SystemTime::now()),
        };
        store.save_throttle(device.id.unwrap(), &state).await.unwrap();

        let loaded = store.load(device.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(loaded.throttle.failure_count, 3);

        assert!(store.save_throttle(Uuid::new_v4(), &state).await.is_err());
    }
}
