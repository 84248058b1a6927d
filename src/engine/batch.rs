use std::sync::Arc;

use super::lock::ProcessingLock;
use super::reply::ReplyController;
use crate::error::ReplyError;
use crate::review::store::ReviewStore;
use crate::review::{Language, ReviewId, Tone};
use crate::session::Session;

/// What happened to one item during a batch draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub id: ReviewId,
    /// The generated text, or why it could not be produced.
    pub outcome: Result<String, ReplyError>,
}

/// Per-item results of a batch draft, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&ReviewId, &ReplyError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.outcome.as_ref().err().map(|e| (&o.id, e)))
    }
}

/// Drafts every pending review, one after another.
pub struct BatchDrafter {
    controller: Arc<ReplyController>,
    store: Arc<ReviewStore>,
    lock: Arc<ProcessingLock>,
    session: Arc<Session>,
}

impl BatchDrafter {
    pub fn new(
        controller: Arc<ReplyController>,
        store: Arc<ReviewStore>,
        lock: Arc<ProcessingLock>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            controller,
            store,
            lock,
            session,
        }
    }

    pub async fn draft_all(
        &self,
        tone: Tone,
        language: Language,
    ) -> Result<BatchReport, ReplyError> {
        self.draft_all_with(tone, language, |_| {}).await
    }

    /// Generate a draft for every item pending at call time. Each item is
    /// finished before the next starts; a failure is recorded and the loop
    /// moves on. `on_outcome` sees each result as it lands.
    pub async fn draft_all_with<F>(
        &self,
        tone: Tone,
        language: Language,
        mut on_outcome: F,
    ) -> Result<BatchReport, ReplyError>
    where
        F: FnMut(&ItemOutcome) + Send,
    {
        self.session.require()?;
        if let Some(holder) = self.lock.holder() {
            return Err(ReplyError::Busy { holder });
        }

        let snapshot = self.store.pending_ids().await;
        tracing::info!(pending = snapshot.len(), %tone, %language, "batch draft started");

        let mut report = BatchReport::default();
        for id in snapshot {
            let outcome = self.controller.generate(&id, tone, language).await;
            if let Err(e) = &outcome {
                tracing::warn!(%id, error = %e, "batch draft item failed, continuing");
            }
            let item = ItemOutcome { id, outcome };
            on_outcome(&item);
            report.outcomes.push(item);
        }

        tracing::info!(
            attempted = report.attempted(),
            failed = report.failed(),
            "batch draft finished"
        );
        Ok(report)
    }
}
