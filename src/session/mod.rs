//! The connected business and the session boundary.
//!
//! Collaborator calls are only valid while a [`BusinessProfile`] is
//! connected. [`Session`] owns it, hands out read-only copies, and emits
//! [`Event::Connected`] / [`Event::Disconnected`] on the [`EventBus`].

pub mod storage;

use std::fmt;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::ReplyError;
use crate::events::{Event, EventBus};

/// Identity of the connected business.
#[derive(Clone, PartialEq, Eq)]
pub struct BusinessProfile {
    pub display_name: String,
    pub account_ref: String,
    pub location_ref: String,
    /// Bearer token for the review platform.
    pub credential: String,
    pub connected: bool,
    pub business_type: Option<String>,
    pub signature: Option<String>,
}

impl BusinessProfile {
    pub fn from_stored(stored: StoredProfile, credential: String) -> Self {
        Self {
            display_name: stored.display_name,
            account_ref: stored.account_ref,
            location_ref: stored.location_ref,
            credential,
            connected: false,
            business_type: stored.business_type,
            signature: stored.signature,
        }
    }

    pub fn to_stored(&self) -> StoredProfile {
        StoredProfile {
            display_name: self.display_name.clone(),
            account_ref: self.account_ref.clone(),
            location_ref: self.location_ref.clone(),
            business_type: self.business_type.clone(),
            signature: self.signature.clone(),
        }
    }

    /// Full platform path of the location, e.g. `accounts/1/locations/2`.
    pub fn location_path(&self) -> String {
        format!("{}/{}", self.account_ref, self.location_ref)
    }
}

impl fmt::Debug for BusinessProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusinessProfile")
            .field("display_name", &self.display_name)
            .field("account_ref", &self.account_ref)
            .field("location_ref", &self.location_ref)
            .field("credential", &"<redacted>")
            .field("connected", &self.connected)
            .field("business_type", &self.business_type)
            .field("signature", &self.signature)
            .finish()
    }
}

/// The part of a profile that survives restarts. Credentials live in
/// [`AuthStorage`](crate::auth::AuthStorage), not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredProfile {
    pub display_name: String,
    pub account_ref: String,
    pub location_ref: String,
    pub business_type: Option<String>,
    pub signature: Option<String>,
}

/// Owns the current profile, if any.
#[derive(Debug, Default)]
pub struct Session {
    profile: RwLock<Option<BusinessProfile>>,
    events: EventBus,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the connected profile, if any.
    pub fn profile(&self) -> Option<BusinessProfile> {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The connected profile, or [`ReplyError::NotConnected`].
    pub fn require(&self) -> Result<BusinessProfile, ReplyError> {
        self.profile().ok_or(ReplyError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn connect(&self, mut profile: BusinessProfile) {
        profile.connected = true;
        let name = profile.display_name.clone();
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = Some(profile);
        tracing::info!(business = %name, "connected");
        self.events.emit(Event::Connected { display_name: name });
    }

    pub fn disconnect(&self) {
        let previous = self
            .profile
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if previous.is_some() {
            tracing::info!("disconnected");
            self.events.emit(Event::Disconnected);
        }
    }

    /// Swap in a refreshed bearer token. No-op while disconnected.
    pub fn set_credential(&self, credential: String) {
        let mut guard = self.profile.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(profile) = guard.as_mut() {
            profile.credential = credential;
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}
