//! Persisted "active device" association.
//!
//! The settings layer owns which TV is active across restarts; the
//! engine only needs to read it at startup and clear it when a reset
//! invalidates the association. This trait is that interface — the
//! filesystem implementation lives in `telerc-config`.

use crate::error::CoreError;
use crate::target::TargetDevice;

/// Seam to the external settings collaborator.
pub trait TargetStore: Send + Sync {
    /// The persisted active device, if any.
    fn active(&self) -> Option<TargetDevice>;

    /// Replace (or clear) the persisted active device.
    fn set_active(&self, target: Option<&TargetDevice>) -> Result<(), CoreError>;
}

/// Volatile store for tests and embedded use.
#[derive(Default)]
pub struct MemoryTargetStore {
    active: std::sync::Mutex<Option<TargetDevice>>,
}

impl MemoryTargetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_active(target: TargetDevice) -> Self {
        Self {
            active: std::sync::Mutex::new(Some(target)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<TargetDevice>> {
        self.active.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TargetStore for MemoryTargetStore {
    fn active(&self) -> Option<TargetDevice> {
        self.lock().clone()
    }

    fn set_active(&self, target: Option<&TargetDevice>) -> Result<(), CoreError> {
        *self.lock() = target.cloned();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTargetStore::new();
        assert!(store.active().is_none());

        let tv = TargetDevice::new("10.0.0.5").with_name("Living Room");
        store.set_active(Some(&tv)).expect("set");
        assert_eq!(store.active(), Some(tv));

        store.set_active(None).expect("clear");
        assert!(store.active().is_none());
    }
}
