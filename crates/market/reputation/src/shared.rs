use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::engine::ReputationEngine;
use crate::error::ReputationError;

/// Cloneable handle to one `ReputationEngine`, shared between the markets
/// bound to it and whoever administers decay schedules.
#[derive(Debug, Clone, Default)]
pub struct SharedReputation {
    inner: Arc<RwLock<ReputationEngine>>,
}

impl SharedReputation {
    pub fn new(engine: ReputationEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, ReputationEngine>, ReputationError> {
        self.inner
            .read()
            .map_err(|e| ReputationError::Unavailable(e.to_string()))
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, ReputationEngine>, ReputationError> {
        self.inner
            .write()
            .map_err(|e| ReputationError::Unavailable(e.to_string()))
    }
}
