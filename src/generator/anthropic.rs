use anyhow::{Context as _, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{ANTHROPIC, AuthStorage};
use crate::consts::DEFAULT_MODEL;
use crate::error::ReplyError;
use crate::prompts::reply::{build_reply_system_prompt, build_review_message};

use super::{GenerationRequest, ReplyGenerator};

const API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// A reply generator that calls the Anthropic Messages API.
pub struct AnthropicGenerator {
    model: String,
    auth: Arc<AuthStorage>,
    base_url: String,
    client: reqwest::Client,
}

impl AnthropicGenerator {
    pub fn new(model: Option<String>, auth: Arc<AuthStorage>) -> Self {
        Self {
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            auth,
            base_url: API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point at a different API host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request_reply(&self, request: &GenerationRequest) -> Result<String> {
        let api_key = self
            .auth
            .get_api_key(ANTHROPIC, API_KEY_ENV)?
            .context("no Anthropic credentials found. Run `quill login anthropic` or set ANTHROPIC_API_KEY.")?;

        let system = build_reply_system_prompt(request);
        let messages = [Message {
            role: "user".to_string(),
            content: build_review_message(request),
        }];

        let body = ApiRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: &system,
            messages: &messages,
        };

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .header("x-api-key", &api_key)
            .json(&body)
            .send()
            .await
            .context("failed to reach the Anthropic API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Anthropic API error ({}): {}", status, text);
        }

        let api_resp: ApiResponse = resp.json().await.context("malformed Anthropic response")?;

        let text: String = api_resp
            .content
            .iter()
            .filter_map(|block| {
                if block.content_type == "text" {
                    block.text.as_deref()
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        if let Some(usage) = api_resp.usage {
            tracing::debug!(
                input = usage.input_tokens,
                output = usage.output_tokens,
                "anthropic token usage"
            );
        }

        let reply = to_plain_text(&text);
        if reply.is_empty() {
            bail!("Anthropic API returned an empty reply");
        }
        Ok(reply)
    }
}

#[async_trait]
impl ReplyGenerator for AnthropicGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ReplyError> {
        self.request_reply(request)
            .await
            .map_err(|e| ReplyError::GenerationFailed(format!("{e:#}")))
    }
}

/// Strip the markup models sometimes add despite instructions. Only forms
/// that cannot be ordinary reply text are removed: a fence around the whole
/// reply, one pair of quotes around the whole reply, `# ` headings and
/// balanced `**` emphasis.
fn to_plain_text(text: &str) -> String {
    let mut body = text.trim();

    if let Some(after) = body.strip_prefix("```")
        && let Some(inner) = after.strip_suffix("```")
        && !inner.contains("```")
    {
        // drop an info string like ```text
        body = match inner.split_once('\n') {
            Some((first, rest)) if !first.contains(' ') => rest,
            _ => inner,
        }
        .trim();
    }

    for (open, close) in [('"', '"'), ('“', '”')] {
        if let Some(inner) = body.strip_prefix(open).and_then(|b| b.strip_suffix(close))
            && !inner.contains(open)
            && !inner.contains(close)
        {
            body = inner.trim();
        }
    }

    let lines: Vec<&str> = body.lines().map(strip_heading).collect();
    let mut plain = lines.join("\n");
    if plain.matches("**").count() % 2 == 0 {
        plain = plain.replace("**", "");
    }
    plain.trim().to_string()
}

/// `# Title` through `###### Title` lose their hashes; `#1 pho` does not.
fn strip_heading(line: &str) -> &str {
    let hashes = line.len() - line.trim_start_matches('#').len();
    match line[hashes..].strip_prefix(' ') {
        Some(rest) if (1..=6).contains(&hashes) => rest.trim_start(),
        _ => line,
    }
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
