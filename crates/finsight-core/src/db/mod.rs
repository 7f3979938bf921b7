//! Encrypted transaction store
//!
//! This module is organized by domain:
//! - `transactions` - Append-only per-user ledger (append, list, clear, reload)
//! - `users` - User registration and the stored per-user key
//!
//! Descriptions are encrypted with the process-wide [`Cipher`] before they reach
//! SQLite and decrypted on the way out. Every other column is stored in clear.
//!
//! The `users.encrypted_key` column holds a random per-user key sealed under the
//! global key, but description encryption never uses it: all rows are sealed
//! with the global key, so there is no per-user cryptographic isolation.

use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::crypto::Cipher;
use crate::error::Result;

mod transactions;
mod users;

pub use transactions::BatchMode;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling and description encryption
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    cipher: Arc<Cipher>,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Open (creating if needed) the database at `path` and run migrations
    pub fn new(path: &str, cipher: Arc<Cipher>) -> Result<Self> {
        // The bundled SQLite enforces foreign keys by default. Ingestion never
        // requires a registered user, so turn them off on every connection.
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
            Ok(())
        });
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            cipher,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        info!(path, key = %db.cipher.fingerprint(), "Database ready");
        Ok(db)
    }

    /// Create a throwaway database with an ephemeral key (for testing)
    ///
    /// Note: Uses a temporary file rather than `:memory:` because each pooled
    /// connection would otherwise see its own empty database.
    pub fn in_memory() -> Result<Self> {
        Self::in_memory_with_cipher(Arc::new(Cipher::ephemeral()?))
    }

    fn in_memory_with_cipher(cipher: Arc<Cipher>) -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "finsight_test_{}_{}.db",
            std::process::id(),
            id
        ));

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy(), cipher)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// The cipher used for descriptions
    pub fn cipher(&self) -> &Cipher {
        &self.cipher
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            -- Users. encrypted_key is a per-user key sealed with the global key;
            -- it is not used for description encryption.
            CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                encrypted_key TEXT NOT NULL
            );

            -- Transactions. description holds ciphertext.
            -- user_id is declared as a reference; foreign keys are switched
            -- off per connection in `Database::new`.
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                confidence REAL,
                FOREIGN KEY(user_id) REFERENCES users(user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
            "#,
        )?;

        Ok(())
    }
}
