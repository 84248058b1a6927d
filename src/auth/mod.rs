pub mod oauth;
pub mod storage;

pub use storage::AuthStorage;

use anyhow::{Context, Result, bail};
use oauth::OAuthClient;
use storage::Credential;

/// Provider that issues review-platform tokens.
pub const GOOGLE: &str = "google";
/// Provider that writes replies.
pub const ANTHROPIC: &str = "anthropic";

/// Complete Google OAuth login: exchange the authorization code and save
/// credentials.
pub async fn login_google(
    db_path: &str,
    client: &OAuthClient,
    code: &str,
    verifier: &str,
) -> Result<()> {
    let credentials = oauth::exchange_code(client, code, verifier).await?;
    let storage = AuthStorage::open(db_path).context("failed to open auth storage")?;
    storage
        .set(GOOGLE, Credential::OAuth(credentials))
        .context("failed to save credentials")?;
    Ok(())
}

/// Save an Anthropic API key.
pub fn login_api_key(db_path: &str, provider: &str, key: &str) -> Result<()> {
    if provider != ANTHROPIC {
        bail!("{provider} does not take an API key");
    }
    let key = key.trim();
    if key.is_empty() {
        bail!("no API key provided");
    }
    let storage = AuthStorage::open(db_path).context("failed to open auth storage")?;
    storage
        .set(
            provider,
            Credential::ApiKey {
                key: key.to_string(),
            },
        )
        .context("failed to save credentials")?;
    Ok(())
}

/// Remove stored credentials for a provider.
pub fn logout(db_path: &str, provider: &str) -> Result<()> {
    let storage = AuthStorage::open(db_path).context("failed to open auth storage")?;
    storage
        .remove(provider)
        .context("failed to remove credentials")?;
    Ok(())
}
