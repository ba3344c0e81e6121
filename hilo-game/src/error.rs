use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] hilo_ledger::LedgerError),

    #[error("Invalid wager: {0}")]
    InvalidWager(String),

    #[error("A wager must be accepted before the game starts")]
    WagerRequired,

    #[error("Invalid guess '{0}': expected 'higher' or 'lower'")]
    InvalidGuess(String),

    #[error("Deck exhausted")]
    DeckExhausted,

    #[error("Invalid game state: {0}")]
    InvalidState(String),

    #[error("Ledger gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Payout transfer failed: {0}")]
    SettlementTransferFailed(String),

    #[error("Best score update failed: {0}")]
    SettlementPersistFailed(String),

    #[error("Invalid catalogue: {0}")]
    Catalogue(String),

    #[error("Invalid rules: {0}")]
    Rules(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
