//! Player balances, the transaction journal and the economic event history.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use sqlx::{PgPool, Row};

use crate::error::LedgerError;
use crate::model::{EconomicEvent, Transaction};

#[async_trait]
pub trait Ledger: Send + Sync {
    async fn balance(&self, player_id: &str) -> Result<f64, LedgerError>;

    /// Add `delta` (negative to debit) and return the new balance.
    async fn adjust_balance(&self, player_id: &str, delta: f64) -> Result<f64, LedgerError>;

    async fn record_transaction(&self, transaction: &Transaction) -> Result<(), LedgerError>;

    /// Highest transaction id in the journal, 0 when it is empty.
    async fn last_transaction_id(&self) -> Result<u64, LedgerError>;

    /// The most recent economic events, newest first.
    async fn recent_economic_events(&self, limit: usize) -> Result<Vec<EconomicEvent>, LedgerError>;
}

#[derive(Debug, Default)]
struct MemoryBook {
    balances: HashMap<String, f64>,
    transactions: Vec<Transaction>,
    economic_events: Vec<EconomicEvent>,
}

/// In-process ledger for tests and the demo binary.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    book: Mutex<MemoryBook>,
    offline: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_player(self, player_id: &str, balance: f64) -> Self {
        self.book
            .lock()
            .balances
            .insert(player_id.to_string(), balance);
        self
    }

    pub fn push_economic_event(&self, event: EconomicEvent) {
        self.book.lock().economic_events.push(event);
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.book.lock().transactions.clone()
    }

    /// While offline every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), LedgerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("memory ledger is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn balance(&self, player_id: &str) -> Result<f64, LedgerError> {
        self.check_online()?;
        self.book
            .lock()
            .balances
            .get(player_id)
            .copied()
            .ok_or_else(|| LedgerError::PlayerNotFound(player_id.to_string()))
    }

    async fn adjust_balance(&self, player_id: &str, delta: f64) -> Result<f64, LedgerError> {
        self.check_online()?;
        let mut book = self.book.lock();
        let balance = book
            .balances
            .get_mut(player_id)
            .ok_or_else(|| LedgerError::PlayerNotFound(player_id.to_string()))?;
        *balance += delta;
        Ok(*balance)
    }

    async fn record_transaction(&self, transaction: &Transaction) -> Result<(), LedgerError> {
        self.check_online()?;
        self.book.lock().transactions.push(transaction.clone());
        Ok(())
    }

    async fn last_transaction_id(&self) -> Result<u64, LedgerError> {
        self.check_online()?;
        Ok(self.book.lock().transactions.iter().map(|tx| tx.id).max().unwrap_or(0))
    }

    async fn recent_economic_events(&self, limit: usize) -> Result<Vec<EconomicEvent>, LedgerError> {
        self.check_online()?;
        let book = self.book.lock();
        let mut events = book.economic_events.clone();
        events.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        events.truncate(limit);
        Ok(events)
    }
}

/// Ledger backed by the `players`, `transactions` and `economic_events` tables.
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_player(&self, player_id: &str, balance: f64) -> Result<(), LedgerError> {
        sqlx::query("INSERT INTO players (id, balance) VALUES ($1, $2)")
            .bind(player_id)
            .bind(balance)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn record_economic_event(&self, event: &EconomicEvent) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO economic_events (description, impact, recorded_at) VALUES ($1, $2, $3)",
        )
        .bind(&event.description)
        .bind(event.impact)
        .bind(event.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn balance(&self, player_id: &str) -> Result<f64, LedgerError> {
        let balance: Option<f64> = sqlx::query_scalar("SELECT balance FROM players WHERE id = $1")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;
        balance.ok_or_else(|| LedgerError::PlayerNotFound(player_id.to_string()))
    }

    async fn adjust_balance(&self, player_id: &str, delta: f64) -> Result<f64, LedgerError> {
        let balance: Option<f64> = sqlx::query_scalar(
            "UPDATE players SET balance = balance + $2 WHERE id = $1 RETURNING balance",
        )
        .bind(player_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;
        balance.ok_or_else(|| LedgerError::PlayerNotFound(player_id.to_string()))
    }

    async fn record_transaction(&self, tx: &Transaction) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO transactions
                (id, player_id, item_id, kind, quantity, unit_price, total, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(tx.id as i64)
        .bind(&tx.player_id)
        .bind(&tx.item_id)
        .bind(tx.kind.as_str())
        .bind(tx.quantity)
        .bind(tx.unit_price)
        .bind(tx.total)
        .bind(tx.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn last_transaction_id(&self) -> Result<u64, LedgerError> {
        let last: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(last).unwrap_or(0))
    }

    async fn recent_economic_events(&self, limit: usize) -> Result<Vec<EconomicEvent>, LedgerError> {
        let rows = sqlx::query(
            "SELECT description, impact, recorded_at FROM economic_events
             ORDER BY recorded_at DESC LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<EconomicEvent, LedgerError> {
                Ok(EconomicEvent {
                    description: row.try_get("description")?,
                    impact: row.try_get("impact")?,
                    recorded_at: row.try_get::<DateTime<Utc>, _>("recorded_at")?,
                })
            })
            .collect()
    }
}
