use std::sync::{Mutex, PoisonError};

use crate::error::ReplyError;
use crate::review::ReviewId;

/// The single in-flight token. At most one generate or publish runs at a
/// time across the whole store; the slot holds the id being processed.
#[derive(Debug, Default)]
pub struct ProcessingLock {
    slot: Mutex<Option<ReviewId>>,
}

impl ProcessingLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the token for `id`, or fail with [`ReplyError::Busy`] naming the
    /// current holder. Never waits.
    pub fn try_acquire(&self, id: &ReviewId) -> Result<ProcessingGuard<'_>, ReplyError> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(holder) = slot.as_ref() {
            return Err(ReplyError::Busy {
                holder: holder.clone(),
            });
        }
        *slot = Some(id.clone());
        Ok(ProcessingGuard { lock: self })
    }

    /// Which item is being processed, if any. Callers use this to disable
    /// competing actions.
    pub fn holder(&self) -> Option<ReviewId> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_held(&self) -> bool {
        self.holder().is_some()
    }

    fn release(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Releases the token when dropped, on success, error and cancellation alike.
#[derive(Debug)]
pub struct ProcessingGuard<'a> {
    lock: &'a ProcessingLock,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
