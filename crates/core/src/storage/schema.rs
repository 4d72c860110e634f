//! On-disk layout of the ledger database.
//!
//! The table and column names are shared with existing `portfolio.db` files
//! and must not change.

/// Storage format for the `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Idempotent schema creation, run on every open.
pub const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT UNIQUE
    );
    CREATE TABLE IF NOT EXISTS transactions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER,
        ticker TEXT,
        quantity REAL,
        price REAL,
        date TEXT,
        type TEXT DEFAULT 'buy',
        FOREIGN KEY(user_id) REFERENCES users(id)
    );
";

pub const SELECT_USER_ID: &str = "SELECT id FROM users WHERE username = ?1";

pub const INSERT_USER: &str = "INSERT OR IGNORE INTO users (username) VALUES (?1)";

pub const INSERT_TRANSACTION: &str = "
    INSERT INTO transactions (user_id, ticker, quantity, price, date, type)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
";

pub const SELECT_TRANSACTIONS: &str = "
    SELECT id, user_id, ticker, quantity, price, date, type
    FROM transactions
    WHERE user_id = ?1
    ORDER BY id
";

pub const SELECT_TRANSACTION: &str = "
    SELECT id, user_id, ticker, quantity, price, date, type
    FROM transactions
    WHERE id = ?1 AND user_id = ?2
";

/// A NULL `type` is the column default, i.e. a buy. The comparison ignores
/// case and padding, matching how rows are parsed on read.
pub const HELD_QUANTITY: &str = "
    SELECT COALESCE(SUM(CASE WHEN lower(trim(type)) = 'sell' THEN -quantity ELSE quantity END), 0.0)
    FROM transactions
    WHERE user_id = ?1 AND ticker = ?2
";

pub const COUNT_TRANSACTIONS: &str = "SELECT COUNT(*) FROM transactions WHERE user_id = ?1";

pub const DELETE_TRANSACTION: &str = "DELETE FROM transactions WHERE id = ?1 AND user_id = ?2";
