use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{GenerationRequest, ReplyGenerator};
use crate::error::ReplyError;

/// A scripted generator for tests. Returns pre-defined replies in order;
/// an `Err` entry fails that call with [`ReplyError::GenerationFailed`].
pub struct MockGenerator {
    replies: Vec<Result<String, String>>,
    index: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies,
            index: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with the same text.
    pub fn always(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string()); 64])
    }

    /// Every call fails.
    pub fn failing(reason: &str) -> Self {
        Self::new(vec![Err(reason.to_string()); 64])
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn calls(&self) -> usize {
        self.index.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplyGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ReplyError> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        let i = self.index.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.get(i).ok_or_else(|| {
            ReplyError::GenerationFailed(format!(
                "MockGenerator: no more replies (called {} times)",
                i + 1
            ))
        })?;
        reply.clone().map_err(ReplyError::GenerationFailed)
    }
}
