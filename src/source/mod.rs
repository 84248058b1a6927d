pub mod google;
pub mod mock;

use async_trait::async_trait;

use crate::error::ReplyError;
use crate::review::ReviewId;

/// A review as the platform reports it, before it enters the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReview {
    pub id: ReviewId,
    pub reviewer_name: String,
    /// 0..=5, or -1 when the platform label was unrecognized.
    pub rating: i32,
    pub content: String,
    /// RFC 3339 creation time.
    pub created_at: String,
    pub existing_reply: Option<String>,
    pub avatar_url: Option<String>,
}

/// Where reviews come from and where replies go.
///
/// Implementations fail with [`ReplyError::SourceUnavailable`].
#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn list_reviews(
        &self,
        location_ref: &str,
        credential: &str,
    ) -> Result<Vec<RemoteReview>, ReplyError>;

    async fn publish_reply(
        &self,
        review_id: &ReviewId,
        credential: &str,
        text: &str,
    ) -> Result<(), ReplyError>;
}
