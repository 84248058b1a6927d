use anyhow::{Context, Result, bail};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngExt;
use sha2::{Digest, Sha256};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Loopback redirect. Nothing listens there; the user copies `code` from
/// the address bar of the failed page.
const REDIRECT_URI: &str = "http://localhost";
const SCOPES: &str = "https://www.googleapis.com/auth/business.manage";

const CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
const CLIENT_SECRET_ENV: &str = "GOOGLE_CLIENT_SECRET";

/// The installed-app OAuth client registered with Google.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
}

impl OAuthClient {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Read the client from `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`.
    pub fn from_env() -> Result<Self> {
        let client_id = non_empty_env(CLIENT_ID_ENV)
            .with_context(|| format!("{CLIENT_ID_ENV} is not set"))?;
        let client_secret = non_empty_env(CLIENT_SECRET_ENV)
            .with_context(|| format!("{CLIENT_SECRET_ENV} is not set"))?;
        Ok(Self::new(client_id, client_secret))
    }

    /// Send token requests somewhere else (tests).
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// OAuth credentials stored after login.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OAuthCredentials {
    pub access: String,
    pub refresh: String,
    /// Expiration timestamp in milliseconds since epoch.
    pub expires: u64,
}

impl OAuthCredentials {
    pub fn is_expired(&self) -> bool {
        now_ms() >= self.expires
    }
}

/// PKCE verifier and challenge pair.
struct Pkce {
    verifier: String,
    challenge: String,
}

/// Generate a PKCE code verifier and S256 challenge.
fn generate_pkce() -> Pkce {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    let verifier = URL_SAFE_NO_PAD.encode(bytes);

    Pkce {
        challenge: challenge_for(&verifier),
        verifier,
    }
}

fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Check that `challenge` is the S256 challenge of `verifier`.
pub fn verify_pkce(verifier: &str, challenge: &str) -> bool {
    challenge_for(verifier) == challenge
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Expiry timestamp with a 5 minute buffer.
fn expires_at(expires_in_secs: u64) -> u64 {
    (now_ms() + expires_in_secs * 1000).saturating_sub(5 * 60 * 1000)
}

/// Build the authorization URL for the user to visit.
/// Returns (url, pkce_verifier). The caller must keep the verifier for token exchange.
pub fn build_authorize_url(client: &OAuthClient) -> (String, String) {
    let pkce = generate_pkce();

    let params = [
        ("client_id", client.client_id.as_str()),
        ("response_type", "code"),
        ("redirect_uri", REDIRECT_URI),
        ("scope", SCOPES),
        ("code_challenge", &pkce.challenge),
        ("code_challenge_method", "S256"),
        ("access_type", "offline"),
        ("prompt", "consent"),
    ];

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoded(v)))
        .collect::<Vec<_>>()
        .join("&");

    let url = format!("{}?{}", AUTHORIZE_URL, query);
    (url, pkce.verifier)
}

/// Accept either the bare code or the whole redirected URL the user copied.
pub fn extract_code(pasted: &str) -> &str {
    let pasted = pasted.trim();
    let Some((_, query)) = pasted.split_once('?') else {
        return pasted;
    };
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("code="))
        .unwrap_or(pasted)
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code(
    client: &OAuthClient,
    auth_code_raw: &str,
    verifier: &str,
) -> Result<OAuthCredentials> {
    let code = percent_decode(extract_code(auth_code_raw));

    let form = [
        ("grant_type", "authorization_code"),
        ("client_id", client.client_id.as_str()),
        ("client_secret", client.client_secret.as_str()),
        ("code", code.as_str()),
        ("redirect_uri", REDIRECT_URI),
        ("code_verifier", verifier),
    ];

    let data = post_token(client, &form).await.context("token exchange failed")?;
    let refresh = data
        .refresh_token
        .context("token exchange returned no refresh token")?;

    Ok(OAuthCredentials {
        access: data.access_token,
        refresh,
        expires: expires_at(data.expires_in),
    })
}

/// Refresh an expired access token. Google usually omits a new refresh
/// token, in which case the old one is kept.
pub async fn refresh_token(client: &OAuthClient, refresh: &str) -> Result<OAuthCredentials> {
    let form = [
        ("grant_type", "refresh_token"),
        ("client_id", client.client_id.as_str()),
        ("client_secret", client.client_secret.as_str()),
        ("refresh_token", refresh),
    ];

    let data = post_token(client, &form).await.context("token refresh failed")?;

    Ok(OAuthCredentials {
        access: data.access_token,
        refresh: data.refresh_token.unwrap_or_else(|| refresh.to_string()),
        expires: expires_at(data.expires_in),
    })
}

async fn post_token(client: &OAuthClient, form: &[(&str, &str)]) -> Result<TokenResponse> {
    let resp = reqwest::Client::new()
        .post(&client.token_url)
        .form(form)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        bail!("{}: {}", status, text);
    }

    Ok(resp.json().await?)
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: u64,
}

/// Minimal URL encoding for query parameters.
fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                out.push_str(&format!("%{:02X}", b));
            }
        }
    }
    out
}

/// Undo `%XX` escapes (Google codes contain `/`, which arrives as `%2F`).
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = s.get(i + 1..i + 3)
            && hex.bytes().all(|b| b.is_ascii_hexdigit())
            && let Ok(b) = u8::from_str_radix(hex, 16)
        {
            out.push(b);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
