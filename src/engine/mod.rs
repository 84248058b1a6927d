//! The reply orchestration engine.
//!
//! [`ReplyEngine`] owns the shared pieces (store, processing lock, session)
//! and the two collaborators, and hands them to the single-item
//! [`ReplyController`] and the [`BatchDrafter`]. The CLI only talks to this.

pub mod batch;
pub mod lock;
pub mod reply;

use std::sync::Arc;

use batch::{BatchDrafter, BatchReport, ItemOutcome};
use lock::ProcessingLock;
use reply::ReplyController;

use crate::error::ReplyError;
use crate::generator::ReplyGenerator;
use crate::review::store::ReviewStore;
use crate::review::{Language, ReviewId, ReviewItem, Tone};
use crate::session::{BusinessProfile, Session};
use crate::source::ReviewSource;

pub struct ReplyEngine {
    store: Arc<ReviewStore>,
    lock: Arc<ProcessingLock>,
    session: Arc<Session>,
    source: Arc<dyn ReviewSource>,
    controller: Arc<ReplyController>,
    batch: BatchDrafter,
}

impl ReplyEngine {
    pub fn new(
        session: Arc<Session>,
        generator: Arc<dyn ReplyGenerator>,
        source: Arc<dyn ReviewSource>,
    ) -> Self {
        let store = Arc::new(ReviewStore::new());
        let lock = Arc::new(ProcessingLock::new());
        let controller = Arc::new(ReplyController::new(
            Arc::clone(&store),
            Arc::clone(&lock),
            Arc::clone(&session),
            generator,
            Arc::clone(&source),
        ));
        let batch = BatchDrafter::new(
            Arc::clone(&controller),
            Arc::clone(&store),
            Arc::clone(&lock),
            Arc::clone(&session),
        );
        Self {
            store,
            lock,
            session,
            source,
            controller,
            batch,
        }
    }

    pub fn store(&self) -> &ReviewStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The review currently being processed, if any.
    pub fn in_flight(&self) -> Option<ReviewId> {
        self.lock.holder()
    }

    pub fn connect(&self, profile: BusinessProfile) {
        self.session.connect(profile);
    }

    /// End the session. Items from the old business are dropped.
    pub async fn disconnect(&self) {
        self.session.disconnect();
        self.store.clear().await;
    }

    /// Replace the store contents with a fresh fetch for the connected business.
    pub async fn reload(&self) -> Result<Vec<ReviewItem>, ReplyError> {
        let profile = self.session.require()?;
        self.store.load(self.source.as_ref(), &profile).await
    }

    pub async fn generate(
        &self,
        id: &ReviewId,
        tone: Tone,
        language: Language,
    ) -> Result<String, ReplyError> {
        self.controller.generate(id, tone, language).await
    }

    pub async fn edit(&self, id: &ReviewId, text: &str) -> Result<ReviewItem, ReplyError> {
        self.controller.edit(id, text).await
    }

    pub async fn publish(&self, id: &ReviewId, text: &str) -> Result<(), ReplyError> {
        self.controller.publish(id, text).await
    }

    pub async fn draft_all(
        &self,
        tone: Tone,
        language: Language,
    ) -> Result<BatchReport, ReplyError> {
        self.batch.draft_all(tone, language).await
    }

    pub async fn draft_all_with<F>(
        &self,
        tone: Tone,
        language: Language,
        on_outcome: F,
    ) -> Result<BatchReport, ReplyError>
    where
        F: FnMut(&ItemOutcome) + Send,
    {
        self.batch.draft_all_with(tone, language, on_outcome).await
    }
}
