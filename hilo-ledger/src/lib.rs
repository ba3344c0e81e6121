//! Ledger gateway for the Higher/Lower wager game
//!
//! This library defines the abstract identity/ledger surface the game settles
//! against ([`LedgerGateway`]), a connect-with-timeout helper that degrades to
//! offline mode, and a local SQLite sandbox implementation.

pub mod error;
pub mod gateway;
pub mod local;
pub mod storage;
pub mod types;

pub use error::{LedgerError, Result};
pub use gateway::{
    establish, GatewayConfig, GatewayConnector, GatewayStatus, LedgerGateway, Network,
};
pub use local::{LocalConnector, LocalLedger};
pub use types::{Amount, FunctionCall, Gas, Receipt, ReceiptKind, TransferRecord, ViewCall};
