use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{RemoteReview, ReviewSource};
use crate::error::ReplyError;
use crate::review::ReviewId;

/// An in-memory review platform for tests. Listing and publishing can be
/// made to fail independently; successful publishes are recorded.
#[derive(Default)]
pub struct MockSource {
    reviews: Mutex<Vec<RemoteReview>>,
    fail_list: AtomicBool,
    fail_publish: AtomicBool,
    published: Mutex<Vec<(ReviewId, String)>>,
    list_calls: Mutex<Vec<(String, String)>>,
}

impl MockSource {
    pub fn new(reviews: Vec<RemoteReview>) -> Self {
        Self {
            reviews: Mutex::new(reviews),
            ..Self::default()
        }
    }

    /// Replace what the next listing returns.
    pub fn set_reviews(&self, reviews: Vec<RemoteReview>) {
        *self.reviews.lock().unwrap_or_else(PoisonError::into_inner) = reviews;
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Replies accepted so far as `(review id, text)`.
    pub fn published(&self) -> Vec<(ReviewId, String)> {
        self.published.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Listing calls so far as `(location, credential)`.
    pub fn list_calls(&self) -> Vec<(String, String)> {
        self.list_calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl ReviewSource for MockSource {
    async fn list_reviews(
        &self,
        location_ref: &str,
        credential: &str,
    ) -> Result<Vec<RemoteReview>, ReplyError> {
        self.list_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((location_ref.to_string(), credential.to_string()));
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ReplyError::SourceUnavailable(
                "MockSource: listing disabled".to_string(),
            ));
        }
        Ok(self.reviews.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    async fn publish_reply(
        &self,
        review_id: &ReviewId,
        _credential: &str,
        text: &str,
    ) -> Result<(), ReplyError> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(ReplyError::SourceUnavailable(
                "MockSource: publishing disabled".to_string(),
            ));
        }
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((review_id.clone(), text.to_string()));
        Ok(())
    }
}
