//! Google Business Profile as a [`ReviewSource`].
//!
//! Reviews and replies go through the v4 `mybusiness` API. Account and
//! location discovery (for `quill locations`) uses the v1 account
//! management and business information APIs.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;

use super::{RemoteReview, ReviewSource};
use crate::error::ReplyError;
use crate::review::ReviewId;
use crate::review::rating::parse_star_rating;

const REVIEWS_BASE: &str = "https://mybusiness.googleapis.com";
const ACCOUNTS_BASE: &str = "https://mybusinessaccountmanagement.googleapis.com";
const LOCATIONS_BASE: &str = "https://mybusinessbusinessinformation.googleapis.com";
const PAGE_SIZE: &str = "50";

/// API hosts. Overridable so tests can point everything at one mock server.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub reviews: String,
    pub accounts: String,
    pub locations: String,
}

impl GoogleEndpoints {
    /// Every API served from one host.
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            reviews: base.clone(),
            accounts: base.clone(),
            locations: base,
        }
    }
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            reviews: REVIEWS_BASE.to_string(),
            accounts: ACCOUNTS_BASE.to_string(),
            locations: LOCATIONS_BASE.to_string(),
        }
    }
}

/// One location the signed-in user can manage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSummary {
    pub account_ref: String,
    pub account_name: String,
    pub location_ref: String,
    pub title: String,
}

pub struct GoogleBusinessSource {
    endpoints: GoogleEndpoints,
    client: reqwest::Client,
}

impl Default for GoogleBusinessSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GoogleBusinessSource {
    pub fn new() -> Self {
        Self::with_endpoints(GoogleEndpoints::default())
    }

    pub fn with_endpoints(endpoints: GoogleEndpoints) -> Self {
        Self {
            endpoints,
            client: reqwest::Client::new(),
        }
    }

    /// Every location under every account the credential can see. No
    /// selection is made here; the caller picks one explicitly.
    pub async fn list_locations(&self, credential: &str) -> Result<Vec<LocationSummary>> {
        let mut summaries = Vec::new();

        let accounts: Vec<WireAccount> = self
            .get_all_pages(
                &format!("{}/v1/accounts", self.endpoints.accounts),
                credential,
                &[],
                |page: AccountsPage| (page.accounts, page.next_page_token),
            )
            .await
            .context("failed to list accounts")?;

        for account in accounts {
            let url = format!("{}/v1/{}/locations", self.endpoints.locations, account.name);
            let locations: Vec<WireLocation> = self
                .get_all_pages(
                    &url,
                    credential,
                    &[("readMask", "name,title")],
                    |page: LocationsPage| (page.locations, page.next_page_token),
                )
                .await
                .with_context(|| format!("failed to list locations of {}", account.name))?;

            summaries.extend(locations.into_iter().map(|location| LocationSummary {
                account_ref: account.name.clone(),
                account_name: account.account_name.clone().unwrap_or_default(),
                location_ref: location.name,
                title: location.title.unwrap_or_default(),
            }));
        }

        Ok(summaries)
    }

    async fn fetch_reviews(
        &self,
        location_ref: &str,
        credential: &str,
    ) -> Result<Vec<RemoteReview>> {
        let url = format!("{}/v4/{}/reviews", self.endpoints.reviews, location_ref);
        let wire: Vec<WireReview> = self
            .get_all_pages(&url, credential, &[("pageSize", PAGE_SIZE)], |page: ReviewsPage| {
                (page.reviews, page.next_page_token)
            })
            .await?;

        Ok(wire
            .into_iter()
            .map(|review| review.into_remote(location_ref))
            .collect())
    }

    async fn put_reply(&self, review_id: &ReviewId, credential: &str, text: &str) -> Result<()> {
        let url = format!("{}/v4/{}/reply", self.endpoints.reviews, review_id);
        let resp = self
            .client
            .put(&url)
            .bearer_auth(credential)
            .json(&serde_json::json!({ "comment": text }))
            .send()
            .await
            .context("failed to reach Google Business Profile")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            bail!("Google Business Profile error ({}): {}", status, body);
        }
        Ok(())
    }

    /// GET `url` repeatedly, following `nextPageToken`, and concatenate the
    /// items `split` pulls out of each page.
    async fn get_all_pages<P, T, F>(
        &self,
        url: &str,
        credential: &str,
        query: &[(&str, &str)],
        split: F,
    ) -> Result<Vec<T>>
    where
        P: for<'de> Deserialize<'de>,
        F: Fn(P) -> (Vec<T>, Option<String>),
    {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self.client.get(url).bearer_auth(credential).query(query);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }

            let resp = req
                .send()
                .await
                .context("failed to reach Google Business Profile")?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                bail!("Google Business Profile error ({}): {}", status, body);
            }

            let page: P = resp.json().await.context("malformed response")?;
            let (mut batch, next) = split(page);
            items.append(&mut batch);

            match next.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl ReviewSource for GoogleBusinessSource {
    async fn list_reviews(
        &self,
        location_ref: &str,
        credential: &str,
    ) -> Result<Vec<RemoteReview>, ReplyError> {
        self.fetch_reviews(location_ref, credential)
            .await
            .map_err(|e| ReplyError::SourceUnavailable(format!("{e:#}")))
    }

    async fn publish_reply(
        &self,
        review_id: &ReviewId,
        credential: &str,
        text: &str,
    ) -> Result<(), ReplyError> {
        self.put_reply(review_id, credential, text)
            .await
            .map_err(|e| ReplyError::SourceUnavailable(format!("{e:#}")))
    }
}

// --- Wire types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewsPage {
    #[serde(default)]
    reviews: Vec<WireReview>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReview {
    /// Full resource name: `accounts/*/locations/*/reviews/*`.
    name: Option<String>,
    review_id: String,
    reviewer: Option<WireReviewer>,
    star_rating: Option<String>,
    comment: Option<String>,
    create_time: Option<String>,
    review_reply: Option<WireReply>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReviewer {
    display_name: Option<String>,
    profile_photo_url: Option<String>,
}

#[derive(Deserialize)]
struct WireReply {
    comment: Option<String>,
}

impl WireReview {
    fn into_remote(self, location_ref: &str) -> RemoteReview {
        let id = self
            .name
            .unwrap_or_else(|| format!("{}/reviews/{}", location_ref, self.review_id));
        let (reviewer_name, avatar_url) = match self.reviewer {
            Some(r) => (r.display_name, r.profile_photo_url),
            None => (None, None),
        };

        RemoteReview {
            id: ReviewId(id),
            reviewer_name: reviewer_name.unwrap_or_else(|| "Anonymous".to_string()),
            rating: parse_star_rating(self.star_rating.as_deref().unwrap_or_default()),
            content: self.comment.unwrap_or_default(),
            created_at: self.create_time.unwrap_or_default(),
            existing_reply: self.review_reply.map(|r| r.comment.unwrap_or_default()),
            avatar_url,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountsPage {
    #[serde(default)]
    accounts: Vec<WireAccount>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAccount {
    name: String,
    account_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationsPage {
    #[serde(default)]
    locations: Vec<WireLocation>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct WireLocation {
    name: String,
    title: Option<String>,
}
