use std::sync::Arc;

use super::lock::ProcessingLock;
use crate::error::ReplyError;
use crate::generator::{GenerationRequest, ReplyGenerator};
use crate::review::store::{ReviewPatch, ReviewStore};
use crate::review::{Language, ReviewId, ReviewItem, ReviewStatus, Tone};
use crate::session::Session;
use crate::source::ReviewSource;

/// Drives one review through generation, editing and publishing.
pub struct ReplyController {
    store: Arc<ReviewStore>,
    lock: Arc<ProcessingLock>,
    session: Arc<Session>,
    generator: Arc<dyn ReplyGenerator>,
    source: Arc<dyn ReviewSource>,
}

impl ReplyController {
    pub fn new(
        store: Arc<ReviewStore>,
        lock: Arc<ProcessingLock>,
        session: Arc<Session>,
        generator: Arc<dyn ReplyGenerator>,
        source: Arc<dyn ReviewSource>,
    ) -> Self {
        Self {
            store,
            lock,
            session,
            generator,
            source,
        }
    }

    /// Generate (or regenerate) a draft for a pending or drafted review.
    ///
    /// On failure the item keeps its previous state and text.
    pub async fn generate(
        &self,
        id: &ReviewId,
        tone: Tone,
        language: Language,
    ) -> Result<String, ReplyError> {
        let profile = self.session.require()?;
        let item = self.store.get(id).await?;
        ensure_status(&item, "generate", &[ReviewStatus::Pending, ReviewStatus::Drafted])?;

        let _guard = self.lock.try_acquire(id)?;

        let request = GenerationRequest {
            business: profile,
            reviewer_name: item.reviewer_name.clone(),
            rating: item.rating(),
            content: item.content.clone(),
            tone,
            language,
        };

        let text = match self.generator.generate(&request).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                return Err(ReplyError::GenerationFailed(
                    "generator returned an empty reply".to_string(),
                ));
            }
            Err(e) => return Err(e),
        };

        self.store.update(id, ReviewPatch::Draft(text.clone())).await?;
        tracing::debug!(%id, %tone, %language, "draft generated");
        Ok(text)
    }

    /// Replace a draft with user text. Only valid while drafted.
    ///
    /// Editing other items is allowed while one is in flight; editing the
    /// in-flight item itself is `Busy`, since its result would overwrite
    /// the edit.
    pub async fn edit(&self, id: &ReviewId, text: &str) -> Result<ReviewItem, ReplyError> {
        if let Some(holder) = self.lock.holder()
            && holder == *id
        {
            return Err(ReplyError::Busy { holder });
        }
        self.store.update(id, ReviewPatch::Edit(text.to_string())).await
    }

    /// Send `text` to the platform as the reply to a drafted review.
    ///
    /// `text` becomes the draft before sending, so a failed publish leaves
    /// exactly what the user submitted in place for a retry.
    pub async fn publish(&self, id: &ReviewId, text: &str) -> Result<(), ReplyError> {
        let profile = self.session.require()?;
        let item = self.store.get(id).await?;
        ensure_status(&item, "publish", &[ReviewStatus::Drafted])?;

        let _guard = self.lock.try_acquire(id)?;

        self.store.update(id, ReviewPatch::Edit(text.to_string())).await?;

        if let Err(e) = self
            .source
            .publish_reply(id, &profile.credential, text)
            .await
        {
            tracing::warn!(%id, error = %e, "publish failed, draft kept");
            return Err(ReplyError::PublishFailed(e.to_string()));
        }

        self.store.update(id, ReviewPatch::Replied(text.to_string())).await?;
        tracing::info!(%id, "reply published");
        Ok(())
    }
}

fn ensure_status(
    item: &ReviewItem,
    operation: &'static str,
    allowed: &[ReviewStatus],
) -> Result<(), ReplyError> {
    let status = item.status();
    if allowed.contains(&status) {
        Ok(())
    } else {
        Err(ReplyError::InvalidState {
            id: item.id.clone(),
            status,
            operation,
        })
    }
}
