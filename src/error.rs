//! Typed failures of the reply lifecycle.
//!
//! Plumbing (HTTP, SQLite, CLI) works in `anyhow`; everything that crosses
//! the [`ReviewSource`](crate::source::ReviewSource) or
//! [`ReplyGenerator`](crate::generator::ReplyGenerator) boundary, and every
//! controller call, speaks [`ReplyError`].

use thiserror::Error;

use crate::review::{ReviewId, ReviewStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    /// Listing or publishing transport failed (network, auth, platform).
    #[error("review source unavailable: {0}")]
    SourceUnavailable(String),

    /// The generator call failed or produced nothing usable.
    #[error("reply generation failed: {0}")]
    GenerationFailed(String),

    /// The platform rejected or never received the reply. The draft is kept.
    #[error("publishing reply failed: {0}")]
    PublishFailed(String),

    #[error("cannot {operation} review {id}: it is {status}")]
    InvalidState {
        id: ReviewId,
        status: ReviewStatus,
        operation: &'static str,
    },

    #[error("no review with id {0}")]
    NotFound(ReviewId),

    /// Another generate or publish is in flight.
    #[error("busy: review {holder} is still being processed")]
    Busy { holder: ReviewId },

    #[error("no business connected. Run `quill connect` first.")]
    NotConnected,
}

impl ReplyError {
    /// Errors that only a misbehaving caller can produce.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::InvalidState { .. } | Self::NotFound(_))
    }
}
