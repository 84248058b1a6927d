pub mod anthropic;
pub mod mock;

use async_trait::async_trait;

use crate::error::ReplyError;
use crate::review::{Language, Tone};
use crate::session::BusinessProfile;

/// Everything the generator needs for one reply. Built fresh per call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub business: BusinessProfile,
    pub reviewer_name: String,
    pub rating: i32,
    pub content: String,
    pub tone: Tone,
    pub language: Language,
}

/// Writes reply text. Could be an LLM or a test script.
///
/// Implementations return plain text and fail with
/// [`ReplyError::GenerationFailed`].
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ReplyError>;
}
