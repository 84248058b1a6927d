//! The authoritative collection of review items for the session.
//!
//! The store is the only place item state changes, and it only changes
//! through [`ReviewPatch`]es that name a legal transition:
//!
//! ```text
//! pending --Draft--> drafted
//! drafted --Draft--> drafted      (regenerate)
//! drafted --Edit---> drafted
//! drafted --Replied--> replied    (terminal)
//! ```
//!
//! Readers get cloned snapshots, never references into the store.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{ReplyState, ReviewId, ReviewItem, ReviewStatus, format_date};
use crate::error::ReplyError;
use crate::session::BusinessProfile;
use crate::source::{RemoteReview, ReviewSource};

/// A single state transition for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewPatch {
    /// Store freshly generated text. Valid from pending or drafted.
    Draft(String),
    /// Replace the draft with user text. Valid from drafted only.
    Edit(String),
    /// Mark as published with the text that was sent. Valid from drafted only.
    Replied(String),
}

impl ReviewPatch {
    fn operation(&self) -> &'static str {
        match self {
            Self::Draft(_) => "draft",
            Self::Edit(_) => "edit",
            Self::Replied(_) => "mark replied",
        }
    }

    fn apply(self, item: &mut ReviewItem) -> Result<(), ReplyError> {
        let status = item.status();
        let next = match (self, status) {
            (Self::Draft(text), ReviewStatus::Pending | ReviewStatus::Drafted) => {
                ReplyState::Drafted(text)
            }
            (Self::Edit(text), ReviewStatus::Drafted) => ReplyState::Drafted(text),
            (Self::Replied(text), ReviewStatus::Drafted) => ReplyState::Replied(text),
            (patch, status) => {
                return Err(ReplyError::InvalidState {
                    id: item.id.clone(),
                    status,
                    operation: patch.operation(),
                });
            }
        };
        item.state = next;
        Ok(())
    }
}

#[derive(Default)]
struct Items {
    order: Vec<ReviewId>,
    by_id: HashMap<ReviewId, ReviewItem>,
}

impl Items {
    fn from_remote(reviews: Vec<RemoteReview>) -> Self {
        let mut items = Self::default();
        for review in reviews {
            if items.by_id.contains_key(&review.id) {
                tracing::warn!(id = %review.id, "duplicate review id from source, keeping first");
                continue;
            }
            let item = item_from_remote(review);
            if item.has_suspect_rating() {
                tracing::warn!(
                    id = %item.id,
                    rating = item.rating(),
                    "review has a rating outside 1..=5"
                );
            }
            items.order.push(item.id.clone());
            items.by_id.insert(item.id.clone(), item);
        }
        items
    }

    fn snapshot(&self) -> Vec<ReviewItem> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .cloned()
            .collect()
    }
}

fn item_from_remote(review: RemoteReview) -> ReviewItem {
    let state = match review.existing_reply {
        Some(reply) => ReplyState::Replied(reply),
        None => ReplyState::Pending,
    };
    ReviewItem::new(
        review.id,
        review.reviewer_name,
        review.rating,
        review.content,
        format_date(&review.created_at),
        review.avatar_url,
        state,
    )
}

/// Ordered, id-keyed review items. Interior `RwLock` so the store can be
/// shared between the controllers and any number of readers.
#[derive(Default)]
pub struct ReviewStore {
    items: RwLock<Items>,
}

impl ReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with what the source reports for the
    /// profile's location. On failure the previous contents stay untouched.
    pub async fn load(
        &self,
        source: &dyn ReviewSource,
        profile: &BusinessProfile,
    ) -> Result<Vec<ReviewItem>, ReplyError> {
        let location = profile.location_path();
        let reviews = match source.list_reviews(&location, &profile.credential).await {
            Ok(reviews) => reviews,
            Err(e) => {
                tracing::warn!(%location, error = %e, "review load failed, keeping last snapshot");
                return Err(e);
            }
        };

        let fresh = Items::from_remote(reviews);
        let snapshot = fresh.snapshot();
        *self.items.write().await = fresh;

        tracing::info!(%location, count = snapshot.len(), "reviews loaded");
        Ok(snapshot)
    }

    /// Apply one transition to one item.
    pub async fn update(
        &self,
        id: &ReviewId,
        patch: ReviewPatch,
    ) -> Result<ReviewItem, ReplyError> {
        let mut items = self.items.write().await;
        let item = items
            .by_id
            .get_mut(id)
            .ok_or_else(|| ReplyError::NotFound(id.clone()))?;
        patch.apply(item)?;
        Ok(item.clone())
    }

    pub async fn get(&self, id: &ReviewId) -> Result<ReviewItem, ReplyError> {
        self.items
            .read()
            .await
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| ReplyError::NotFound(id.clone()))
    }

    /// All items in display order.
    pub async fn snapshot(&self) -> Vec<ReviewItem> {
        self.items.read().await.snapshot()
    }

    /// Ids of items that are pending right now, in display order.
    pub async fn pending_ids(&self) -> Vec<ReviewId> {
        let items = self.items.read().await;
        items
            .order
            .iter()
            .filter(|id| {
                items
                    .by_id
                    .get(*id)
                    .is_some_and(|item| item.status() == ReviewStatus::Pending)
            })
            .cloned()
            .collect()
    }

    /// Items whose rating could not be mapped onto 1..=5.
    pub async fn flagged(&self) -> Vec<ReviewItem> {
        self.snapshot()
            .await
            .into_iter()
            .filter(ReviewItem::has_suspect_rating)
            .collect()
    }

    /// The id shown at a 1-based display position.
    pub async fn id_at(&self, position: usize) -> Option<ReviewId> {
        let index = position.checked_sub(1)?;
        self.items.read().await.order.get(index).cloned()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop everything. Used when the session ends.
    pub async fn clear(&self) {
        *self.items.write().await = Items::default();
    }
}
