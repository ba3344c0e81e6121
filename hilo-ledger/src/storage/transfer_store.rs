use crate::error::{LedgerError, Result};
use crate::storage::Storage;
use crate::types::{Amount, TransferRecord};
use chrono::Utc;
use rusqlite::params;

pub struct TransferStore<'a> {
    storage: &'a Storage,
}

impl<'a> TransferStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn record(&self, transfer: &TransferRecord) -> Result<()> {
        let conn = self.storage.get_connection().await;

        conn.execute(
            "INSERT INTO transfers (id, sender_id, receiver_id, amount, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                transfer.id,
                transfer.sender_id,
                transfer.receiver_id,
                transfer.amount.as_yocto().to_string(),
                transfer.created_at.timestamp(),
            ],
        )?;

        tracing::info!(
            "Recorded transfer {} of {} to {}",
            transfer.id,
            transfer.amount,
            transfer.receiver_id
        );
        Ok(())
    }

    /// Transfers received by `receiver_id`, newest first.
    pub async fn list_for(&self, receiver_id: &str) -> Result<Vec<TransferRecord>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, sender_id, receiver_id, amount, created_at
             FROM transfers WHERE receiver_id = ?1 ORDER BY created_at DESC, rowid DESC",
        )?;

        let rows = stmt.query_map(params![receiver_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut transfers = Vec::new();
        for row in rows {
            let (id, sender_id, receiver_id, amount, created_at) = row?;
            let yocto: u128 = amount
                .parse()
                .map_err(|_| LedgerError::internal(format!("Corrupt amount in transfer {}", id)))?;

            transfers.push(TransferRecord {
                id,
                sender_id,
                receiver_id,
                amount: Amount::from_yocto(yocto),
                created_at: chrono::DateTime::from_timestamp(created_at, 0)
                    .unwrap_or_else(Utc::now),
            });
        }

        Ok(transfers)
    }

    pub async fn total_for(&self, receiver_id: &str) -> Result<Amount> {
        let transfers = self.list_for(receiver_id).await?;
        transfers
            .iter()
            .try_fold(Amount::ZERO, |acc, t| acc.checked_add(t.amount))
            .ok_or_else(|| LedgerError::internal("Balance overflow"))
    }
}
