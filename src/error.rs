use thiserror::Error;

/// Failures of territory and event operations.
#[derive(Debug, Error, PartialEq)]
pub enum WorldError {
    #[error("Territory not found: {0}")]
    TerritoryNotFound(String),
    #[error("invalid bounds: ({x1}, {y1}) must be strictly below ({x2}, {y2})")]
    InvalidBounds { x1: f64, y1: f64, x2: f64, y2: f64 },
    #[error("territory value must be positive, got {0}")]
    InvalidValue(f64),
}

/// Business failures of market trades. The display strings are the messages
/// callers see in the structured trade outcome.
#[derive(Debug, Error, PartialEq)]
pub enum TradeError {
    #[error("Item not found")]
    ItemNotFound,
    #[error("Player not found")]
    PlayerNotFound,
    #[error("Invalid quantity")]
    InvalidQuantity,
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Transaction failed")]
    TransactionFailed,
}

/// The cache could not be reached or returned something unusable.
///
/// Always soft: callers log it and continue with in-memory state.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache payload for {key} is not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Player ledger failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("player {0} not found")]
    PlayerNotFound(String),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<LedgerError> for TradeError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::PlayerNotFound(_) => TradeError::PlayerNotFound,
            LedgerError::Unavailable(_) | LedgerError::Database(_) => TradeError::TransactionFailed,
        }
    }
}
