use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::StoredProfile;

/// Persists the connected business between runs.
///
/// Shares a database with [`AuthStorage`](crate::auth::AuthStorage) and
/// [`Config`](crate::config::Config). Only one business is kept.
pub struct ProfileStorage {
    conn: Mutex<Connection>,
}

const SLOT: &str = "current";

impl ProfileStorage {
    /// Open or create the profile table in the given database.
    /// Use `":memory:"` for tests.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).context("failed to open profile database")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS business_profile (
                slot TEXT PRIMARY KEY,
                data TEXT NOT NULL
            )",
        )
        .context("failed to create business_profile table")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn load(&self) -> Result<Option<StoredProfile>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare("SELECT data FROM business_profile WHERE slot = ?1")?;
        let mut rows = stmt.query([SLOT])?;
        match rows.next()? {
            Some(row) => {
                let json: String = row.get(0)?;
                let profile =
                    serde_json::from_str(&json).context("stored business profile is corrupt")?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    pub fn save(&self, profile: &StoredProfile) -> Result<()> {
        let json = serde_json::to_string(profile)?;
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO business_profile (slot, data) VALUES (?1, ?2)
             ON CONFLICT(slot) DO UPDATE SET data = excluded.data",
            [SLOT, &json],
        )?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute("DELETE FROM business_profile", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> StoredProfile {
        StoredProfile {
            display_name: "Pho 24".to_string(),
            account_ref: "accounts/1".to_string(),
            location_ref: "locations/2".to_string(),
            business_type: None,
            signature: Some("Minh, owner".to_string()),
        }
    }

    #[test]
    fn empty_by_default() {
        let storage = ProfileStorage::open(":memory:").unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let storage = ProfileStorage::open(":memory:").unwrap();
        storage.save(&stored()).unwrap();
        assert_eq!(storage.load().unwrap().unwrap(), stored());
    }

    #[test]
    fn save_replaces_previous() {
        let storage = ProfileStorage::open(":memory:").unwrap();
        storage.save(&stored()).unwrap();
        let other = StoredProfile {
            display_name: "Banh Mi Bar".to_string(),
            ..stored()
        };
        storage.save(&other).unwrap();
        assert_eq!(storage.load().unwrap().unwrap().display_name, "Banh Mi Bar");
    }

    #[test]
    fn clear_forgets_profile() {
        let storage = ProfileStorage::open(":memory:").unwrap();
        storage.save(&stored()).unwrap();
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile-test.db");
        let path_str = path.to_str().unwrap();

        {
            let storage = ProfileStorage::open(path_str).unwrap();
            storage.save(&stored()).unwrap();
        }

        {
            let storage = ProfileStorage::open(path_str).unwrap();
            assert_eq!(storage.load().unwrap().unwrap(), stored());
        }
    }
}
