use crate::error::Result;
use crate::storage::Storage;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

pub struct ContractStore<'a> {
    storage: &'a Storage,
}

impl<'a> ContractStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn get(&self, contract_id: &str, key: &str) -> Result<Option<Value>> {
        let conn = self.storage.get_connection().await;

        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM contract_state WHERE contract_id = ?1 AND key = ?2",
                params![contract_id, key],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn put(&self, contract_id: &str, key: &str, value: &Value) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT OR REPLACE INTO contract_state (contract_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                contract_id,
                key,
                serde_json::to_string(value)?,
                Utc::now().timestamp()
            ],
        )?;

        tracing::debug!("Stored {}:{} on contract state", contract_id, key);
        Ok(())
    }
}
