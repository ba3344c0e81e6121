pub mod config;
pub mod connect;

pub use config::{GatewayConfig, Network};
pub use connect::{establish, GatewayStatus};

use crate::error::Result;
use crate::types::{Amount, FunctionCall, Receipt, ViewCall};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Identity and remote-procedure surface of the external ledger.
///
/// Game code only talks to this trait; the concrete transport (RPC node,
/// browser wallet, local sandbox) lives behind it.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Account currently signed in, if any.
    fn account_id(&self) -> Option<String>;

    fn is_signed_in(&self) -> bool {
        self.account_id().is_some()
    }

    /// Read-only contract call.
    async fn view_method(&self, call: ViewCall) -> Result<Value>;

    /// State-changing contract call signed by the current account.
    async fn call_method(&self, call: FunctionCall) -> Result<Receipt>;

    /// Move `amount` from the signed-in account to `receiver_id`.
    async fn transfer(&self, receiver_id: &str, amount: Amount) -> Result<Receipt>;
}

/// Produces a connected gateway handle. Connection may be slow or fail.
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn connect(&self, config: &GatewayConfig) -> Result<Arc<dyn LedgerGateway>>;
}
