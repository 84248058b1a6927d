use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::oauth::{self, OAuthClient, OAuthCredentials};

/// Credential types stored per provider.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum Credential {
    #[serde(rename = "oauth")]
    OAuth(OAuthCredentials),
    #[serde(rename = "api_key")]
    ApiKey { key: String },
}

/// Manages credential storage in SQLite.
///
/// Shares a database with [`Config`](crate::config::Config) and
/// [`ProfileStorage`](crate::session::storage::ProfileStorage).
pub struct AuthStorage {
    conn: Mutex<Connection>,
}

impl AuthStorage {
    /// Open or create a credentials table in the given database path.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open auth database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS credentials (
                provider TEXT PRIMARY KEY,
                data     TEXT NOT NULL
            )",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get credential for a provider.
    pub fn get(&self, provider: &str) -> Result<Option<Credential>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare("SELECT data FROM credentials WHERE provider = ?1")?;
        let mut rows = stmt.query([provider])?;
        match rows.next()? {
            Some(row) => {
                let json: String = row.get(0)?;
                let cred: Credential = serde_json::from_str(&json)?;
                Ok(Some(cred))
            }
            None => Ok(None),
        }
    }

    /// Store credential for a provider (upsert).
    pub fn set(&self, provider: &str, credential: Credential) -> Result<()> {
        let json = serde_json::to_string(&credential)?;
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO credentials (provider, data) VALUES (?1, ?2)
             ON CONFLICT(provider) DO UPDATE SET data = excluded.data",
            [provider, &json],
        )?;
        Ok(())
    }

    /// Remove credential for a provider.
    pub fn remove(&self, provider: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute("DELETE FROM credentials WHERE provider = ?1", [provider])?;
        Ok(())
    }

    /// Get a static API key for a provider.
    /// Priority: stored API key → environment variable.
    pub fn get_api_key(&self, provider: &str, env_var: &str) -> Result<Option<String>> {
        if let Some(Credential::ApiKey { key }) = self.get(provider)? {
            return Ok(Some(key));
        }

        if let Ok(key) = std::env::var(env_var)
            && !key.is_empty()
        {
            return Ok(Some(key));
        }

        Ok(None)
    }

    /// Get a bearer token for an OAuth provider, refreshing it first when
    /// it has expired. `None` when the provider was never logged in to.
    pub async fn get_access_token(
        &self,
        provider: &str,
        client: &OAuthClient,
    ) -> Result<Option<String>> {
        match self.get(provider)? {
            Some(Credential::OAuth(creds)) if creds.is_expired() => {
                tracing::debug!(provider, "access token expired, refreshing");
                let refreshed = oauth::refresh_token(client, &creds.refresh).await?;
                let access = refreshed.access.clone();
                self.set(provider, Credential::OAuth(refreshed))?;
                Ok(Some(access))
            }
            Some(Credential::OAuth(creds)) => Ok(Some(creds.access)),
            Some(Credential::ApiKey { key }) => Ok(Some(key)),
            None => Ok(None),
        }
    }
}
