use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::CoreError;
use crate::models::transaction::{
    normalize_ticker, NewTransaction, TradeRequest, Transaction, TransactionId, TransactionKind,
};
use crate::models::user::UserId;
use crate::services::transaction_validator::TransactionValidator;

use super::schema;

/// How long a writer waits for another connection's lock before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw column values of a `transactions` row, converted after the query.
type TransactionRow = (i64, i64, String, f64, f64, String, Option<String>);

/// Durable per-user transaction log backed by SQLite.
///
/// The store owns every persisted transaction. Deletion is always scoped to
/// the owning user; there is no update.
pub struct LedgerStore {
    conn: Connection,
    validator: TransactionValidator,
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl LedgerStore {
    /// Open (or create) a ledger database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened ledger database");
        Self::init(conn)
    }

    /// Open a private in-memory ledger. Contents vanish when dropped.
    pub fn open_in_memory() -> Result<Self, CoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, CoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(schema::CREATE_TABLES)?;
        Ok(Self {
            conn,
            validator: TransactionValidator::new(),
        })
    }

    // ── Users ───────────────────────────────────────────────────────

    /// Return the id for `name`, creating the user on first sight.
    /// Calling it again with the same name always yields the same id.
    pub fn resolve_or_create_user(&self, name: &str) -> Result<UserId, CoreError> {
        let name = self.validator.validate_username(name)?;

        let inserted = self.conn.execute(schema::INSERT_USER, params![name])?;
        let id: i64 = self
            .conn
            .query_row(schema::SELECT_USER_ID, params![name], |r| r.get(0))?;

        if inserted == 1 {
            info!(user = %name, id, "created user");
        } else {
            debug!(user = %name, id, "reusing existing user");
        }
        Ok(UserId(id))
    }

    /// Look up a user without creating one.
    pub fn find_user(&self, name: &str) -> Result<Option<UserId>, CoreError> {
        let id = self
            .conn
            .query_row(schema::SELECT_USER_ID, params![name.trim()], |r| r.get(0))
            .optional()?;
        Ok(id.map(UserId))
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Append a trade after input validation only (no holdings check).
    ///
    /// `date` of `None` or blank means today on the local clock.
    pub fn add_transaction(
        &self,
        user_id: UserId,
        ticker: &str,
        quantity: f64,
        price: f64,
        date: Option<&str>,
        kind: TransactionKind,
    ) -> Result<TransactionId, CoreError> {
        let request = TradeRequest {
            ticker: ticker.to_string(),
            quantity,
            price,
            date: date.map(str::to_string),
            kind,
        };
        let trade = self.validator.validate_request(&request, today())?;
        let id = insert(&self.conn, user_id, &trade)?;
        debug!(user = %user_id, id = %id, ticker = %trade.ticker, kind = %trade.kind, "appended transaction");
        Ok(id)
    }

    /// Validate a trade, check holdings for sells, and append it, all inside
    /// one `IMMEDIATE` SQLite transaction.
    ///
    /// The write lock is taken before the held quantity is read, so two
    /// writers can never both pass the oversell check on the same stale
    /// quantity. On any error nothing is written.
    pub fn record_trade(
        &mut self,
        user_id: UserId,
        request: &TradeRequest,
    ) -> Result<Transaction, CoreError> {
        let trade = self.validator.validate_request(request, today())?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let held = held_quantity(&tx, user_id, &trade.ticker)?;
        self.validator
            .check_holdings(trade.kind, &trade.ticker, trade.quantity, held)?;

        let id = insert(&tx, user_id, &trade)?;
        tx.commit()?;

        info!(
            user = %user_id,
            id = %id,
            ticker = %trade.ticker,
            kind = %trade.kind,
            quantity = trade.quantity,
            price = trade.price,
            held_before = held,
            "recorded trade"
        );

        Ok(Transaction {
            id,
            user_id,
            ticker: trade.ticker,
            quantity: trade.quantity,
            price: trade.price,
            date: trade.date,
            kind: trade.kind,
        })
    }

    /// Delete one of the user's transactions.
    /// Fails with `NotFound` when the id does not exist or belongs to someone else.
    pub fn delete_transaction(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> Result<(), CoreError> {
        let deleted = self
            .conn
            .execute(schema::DELETE_TRANSACTION, params![transaction_id.0, user_id.0])?;
        if deleted == 0 {
            return Err(CoreError::NotFound(transaction_id));
        }
        debug!(user = %user_id, id = %transaction_id, "deleted transaction");
        Ok(())
    }

    /// All of the user's transactions in insertion order.
    pub fn list_transactions(&self, user_id: UserId) -> Result<Vec<Transaction>, CoreError> {
        let mut stmt = self.conn.prepare(schema::SELECT_TRANSACTIONS)?;
        let rows = stmt.query_map(params![user_id.0], read_row)?;

        let mut transactions = Vec::new();
        for row in rows {
            transactions.push(into_transaction(row?)?);
        }
        Ok(transactions)
    }

    /// A single transaction, if it exists and belongs to the user.
    pub fn get_transaction(
        &self,
        user_id: UserId,
        transaction_id: TransactionId,
    ) -> Result<Option<Transaction>, CoreError> {
        let row = self
            .conn
            .query_row(
                schema::SELECT_TRANSACTION,
                params![transaction_id.0, user_id.0],
                read_row,
            )
            .optional()?;
        row.map(into_transaction).transpose()
    }

    /// Σ buys − Σ sells of `ticker` for the user; 0 when there are none.
    pub fn held_quantity(&self, user_id: UserId, ticker: &str) -> Result<f64, CoreError> {
        held_quantity(&self.conn, user_id, &normalize_ticker(ticker))
    }

    pub fn transaction_count(&self, user_id: UserId) -> Result<usize, CoreError> {
        let count: i64 = self
            .conn
            .query_row(schema::COUNT_TRANSACTIONS, params![user_id.0], |r| r.get(0))?;
        Ok(count as usize)
    }
}

// ── Row helpers ─────────────────────────────────────────────────────

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn held_quantity(conn: &Connection, user_id: UserId, ticker: &str) -> Result<f64, CoreError> {
    let held: f64 = conn.query_row(schema::HELD_QUANTITY, params![user_id.0, ticker], |r| {
        r.get(0)
    })?;
    Ok(held)
}

fn insert(conn: &Connection, user_id: UserId, trade: &NewTransaction) -> Result<TransactionId, CoreError> {
    conn.execute(
        schema::INSERT_TRANSACTION,
        params![
            user_id.0,
            trade.ticker,
            trade.quantity,
            trade.price,
            trade.date.format(schema::DATE_FORMAT).to_string(),
            trade.kind.as_str(),
        ],
    )?;
    Ok(TransactionId(conn.last_insert_rowid()))
}

fn read_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<TransactionRow> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
    ))
}

fn into_transaction(row: TransactionRow) -> Result<Transaction, CoreError> {
    let (id, user_id, ticker, quantity, price, date, kind) = row;

    let date = NaiveDate::parse_from_str(&date, schema::DATE_FORMAT).map_err(|e| {
        CoreError::Database(format!("Transaction {id} has an unreadable date '{date}': {e}"))
    })?;

    let kind = match kind.as_deref() {
        None => TransactionKind::Buy,
        Some(raw) => raw.parse().map_err(|_| {
            CoreError::Database(format!("Transaction {id} has an unknown type '{raw}'"))
        })?,
    };

    Ok(Transaction {
        id: TransactionId(id),
        user_id: UserId(user_id),
        ticker,
        quantity,
        price,
        date,
        kind,
    })
}
