use crate::error::Result;
use crate::storage::Storage;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

/// Key/value auth store, the sandbox stand-in for browser local storage.
pub struct SessionStore<'a> {
    storage: &'a Storage,
}

impl<'a> SessionStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.storage.get_connection().await;

        let value = conn
            .query_row(
                "SELECT value FROM auth_keys WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT OR REPLACE INTO auth_keys (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().timestamp()],
        )?;

        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.storage.get_connection().await;
        let removed = conn.execute("DELETE FROM auth_keys WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }
}
