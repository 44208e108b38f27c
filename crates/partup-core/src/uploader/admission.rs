//! Process-wide limit on concurrent uploads.
//!
//! Each `save_file` call holds one permit for its whole duration. The permit
//! is released when dropped, on every exit path.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::UploadError;

/// Shared upload admission limiter. Clones share the same permits.
#[derive(Debug, Clone)]
pub struct AdmissionLimiter {
    semaphore: Arc<Semaphore>,
    max: usize,
}

/// Held by a running upload; releases its slot on drop.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionLimiter {
    /// Limiter admitting `max` uploads at once (at least one).
    pub fn new(max: usize) -> Self {
        let max = max.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max)),
            max,
        }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> Result<AdmissionPermit, UploadError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| UploadError::Dispatch("upload admission limiter closed".into()))?;
        Ok(AdmissionPermit { _permit: permit })
    }
}
