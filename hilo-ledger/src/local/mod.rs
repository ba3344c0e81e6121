//! SQLite-backed sandbox ledger.
//!
//! Implements [`LedgerGateway`] without a network: the signed-in account is
//! kept under `<app_key_prefix>_wallet_auth_key`, the score contract
//! (`getBestScore` / `setBestScore`) is emulated on a key/value table, and
//! transfers are appended to a local journal.

use crate::error::{LedgerError, Result};
use crate::gateway::{GatewayConfig, GatewayConnector, LedgerGateway};
use crate::storage::{ContractStore, SessionStore, Storage, TransferStore};
use crate::types::{
    validate_account_id, Amount, FunctionCall, Receipt, ReceiptKind, TransferRecord, ViewCall,
};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub const DB_FILE: &str = "hilo-ledger.db";

const GET_BEST_SCORE: &str = "getBestScore";
const SET_BEST_SCORE: &str = "setBestScore";

pub struct LocalLedger {
    config: GatewayConfig,
    storage: Arc<Storage>,
    account_id: RwLock<Option<String>>,
}

impl LocalLedger {
    pub async fn open(data_dir: &Path, config: GatewayConfig) -> Result<Self> {
        config.validate()?;
        let storage = Arc::new(Storage::new(&data_dir.join(DB_FILE)).await?);

        let ledger = Self {
            config,
            storage,
            account_id: RwLock::new(None),
        };

        let account_id = SessionStore::new(&ledger.storage)
            .get(&ledger.auth_key())
            .await?;
        *ledger.account_id.write() = account_id;

        Ok(ledger)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn auth_key(&self) -> String {
        format!("{}_wallet_auth_key", self.config.app_key_prefix)
    }

    fn signer(&self) -> Result<String> {
        self.account_id.read().clone().ok_or(LedgerError::NotSignedIn)
    }

    fn contract_for<'a>(&'a self, requested: &'a Option<String>) -> &'a str {
        requested.as_deref().unwrap_or(&self.config.contract_id)
    }

    pub async fn sign_in(&self, account_id: &str) -> Result<()> {
        validate_account_id(account_id)?;
        SessionStore::new(&self.storage)
            .set(&self.auth_key(), account_id)
            .await?;
        *self.account_id.write() = Some(account_id.to_string());

        tracing::info!("Signed in as {} on {}", account_id, self.config.network);
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<()> {
        SessionStore::new(&self.storage)
            .remove(&self.auth_key())
            .await?;
        let previous = self.account_id.write().take();

        if let Some(account_id) = previous {
            tracing::info!("Signed out {}", account_id);
        }
        Ok(())
    }

    pub async fn transfers_to(&self, account_id: &str) -> Result<Vec<TransferRecord>> {
        TransferStore::new(&self.storage).list_for(account_id).await
    }

    pub async fn balance_of(&self, account_id: &str) -> Result<Amount> {
        TransferStore::new(&self.storage).total_for(account_id).await
    }

    fn best_score_key(account_id: &str) -> String {
        format!("best_score:{}", account_id)
    }
}

#[async_trait]
impl LedgerGateway for LocalLedger {
    fn account_id(&self) -> Option<String> {
        self.account_id.read().clone()
    }

    async fn view_method(&self, call: ViewCall) -> Result<Value> {
        let contract_id = self.contract_for(&call.contract_id);

        match call.method.as_str() {
            GET_BEST_SCORE => {
                let account_id = call
                    .args
                    .get("account_id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| LedgerError::rpc("getBestScore requires an account_id"))?;

                let value = ContractStore::new(&self.storage)
                    .get(contract_id, &Self::best_score_key(account_id))
                    .await?;
                Ok(value.unwrap_or(Value::Null))
            }
            other => Err(LedgerError::method_not_found(contract_id, other)),
        }
    }

    async fn call_method(&self, call: FunctionCall) -> Result<Receipt> {
        let signer_id = self.signer()?;
        let contract_id = self.contract_for(&call.contract_id).to_string();

        match call.method.as_str() {
            SET_BEST_SCORE => {
                let score = call
                    .args
                    .get("score")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| LedgerError::rpc("setBestScore requires a numeric score"))?;

                ContractStore::new(&self.storage)
                    .put(&contract_id, &Self::best_score_key(&signer_id), &Value::from(score))
                    .await?;
            }
            other => return Err(LedgerError::method_not_found(contract_id, other)),
        }

        if !call.deposit.is_zero() {
            tracing::debug!(
                "Sandbox ignores attached deposit of {} on {}",
                call.deposit,
                call.method
            );
        }

        Ok(Receipt {
            id: Uuid::new_v4().to_string(),
            signer_id,
            kind: ReceiptKind::FunctionCall {
                contract_id,
                method: call.method,
            },
            timestamp: Utc::now(),
        })
    }

    async fn transfer(&self, receiver_id: &str, amount: Amount) -> Result<Receipt> {
        let signer_id = self.signer()?;
        validate_account_id(receiver_id)?;
        if amount.is_zero() {
            return Err(LedgerError::invalid_amount("transfer amount must be positive"));
        }

        let record = TransferRecord {
            id: Uuid::new_v4().to_string(),
            sender_id: signer_id.clone(),
            receiver_id: receiver_id.to_string(),
            amount,
            created_at: Utc::now(),
        };
        TransferStore::new(&self.storage).record(&record).await?;

        Ok(Receipt {
            id: record.id,
            signer_id,
            kind: ReceiptKind::Transfer {
                receiver_id: record.receiver_id,
                amount,
            },
            timestamp: record.created_at,
        })
    }
}

/// Connects by opening (or creating) the sandbox database under `data_dir`.
pub struct LocalConnector {
    data_dir: PathBuf,
}

impl LocalConnector {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

#[async_trait]
impl GatewayConnector for LocalConnector {
    async fn connect(&self, config: &GatewayConfig) -> Result<Arc<dyn LedgerGateway>> {
        let ledger = LocalLedger::open(&self.data_dir, config.clone()).await?;
        Ok(Arc::new(ledger))
    }
}
