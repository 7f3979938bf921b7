//! Transaction ledger operations
//!
//! Rows are only ever appended or wiped per user; there is no update in place.

use std::collections::BTreeSet;

use rusqlite::{params, Connection};
use tracing::{debug, info, warn};

use super::Database;
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction};

/// How a multi-row write behaves when a row fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// One insert per row with no enclosing transaction. A failure part-way
    /// leaves the earlier rows written.
    #[default]
    PerRow,
    /// All rows in a single SQLite transaction, rolled back on any failure
    Atomic,
}

const INSERT_SQL: &str = r#"
    INSERT INTO transactions (user_id, date, description, amount, category, confidence)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
"#;

fn insert_sealed(conn: &Connection, tx: &NewTransaction, sealed: &str) -> Result<i64> {
    conn.execute(
        INSERT_SQL,
        params![
            tx.user_id,
            tx.date,
            sealed,
            tx.amount,
            tx.category,
            tx.confidence,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Append one transaction, encrypting its description. Returns the new row id.
    pub fn append_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        let sealed = self.cipher().encrypt(&tx.description)?;
        let conn = self.conn()?;
        let id = insert_sealed(&conn, tx, &sealed)?;
        debug!(id, user_id = %tx.user_id, "Appended transaction");
        Ok(id)
    }

    /// Append many transactions. Returns the number of rows written.
    pub fn append_transactions(&self, txs: &[NewTransaction], mode: BatchMode) -> Result<usize> {
        match mode {
            BatchMode::PerRow => {
                let conn = self.conn()?;
                for (written, tx) in txs.iter().enumerate() {
                    let result = self
                        .cipher()
                        .encrypt(&tx.description)
                        .and_then(|sealed| insert_sealed(&conn, tx, &sealed));
                    if let Err(e) = result {
                        warn!(
                            written,
                            total = txs.len(),
                            error = %e,
                            "Batch append stopped part-way; earlier rows remain"
                        );
                        return Err(e);
                    }
                }
                Ok(txs.len())
            }
            BatchMode::Atomic => {
                let sealed = self.seal_all(txs)?;
                let mut conn = self.conn()?;
                let db_tx = conn.transaction()?;
                for (tx, sealed) in txs.iter().zip(&sealed) {
                    insert_sealed(&db_tx, tx, sealed)?;
                }
                db_tx.commit()?;
                Ok(txs.len())
            }
        }
    }

    /// List a user's transactions in insertion order, descriptions decrypted
    ///
    /// Any row that fails to decrypt aborts the whole read with
    /// [`Error::Decryption`]. A user with no rows gets an empty list.
    pub fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, date, description, amount, category, confidence
            FROM transactions
            WHERE user_id = ?
            ORDER BY id
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<f64>>(6)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, user_id, date, sealed, amount, category, confidence)| {
                let description = self.cipher().decrypt(&sealed).map_err(|e| {
                    Error::Decryption(format!("transaction {} for user {}: {}", id, user_id, e))
                })?;
                Ok(Transaction {
                    id,
                    user_id,
                    date,
                    description,
                    amount,
                    category,
                    confidence,
                })
            })
            .collect()
    }

    /// Number of stored rows for a user
    pub fn count_transactions(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete every transaction for a user. Returns rows removed.
    pub fn clear_transactions(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM transactions WHERE user_id = ?",
            params![user_id],
        )?;
        info!(user_id, removed, "Cleared transactions");
        Ok(removed)
    }

    /// Bulk reload: wipe each user present in `txs`, then append `txs`
    ///
    /// In [`BatchMode::Atomic`] the wipes and inserts share one transaction.
    pub fn reload_transactions(&self, txs: &[NewTransaction], mode: BatchMode) -> Result<usize> {
        let users: BTreeSet<&str> = txs.iter().map(|t| t.user_id.as_str()).collect();

        match mode {
            BatchMode::PerRow => {
                for user in &users {
                    self.clear_transactions(user)?;
                }
                self.append_transactions(txs, BatchMode::PerRow)
            }
            BatchMode::Atomic => {
                let sealed = self.seal_all(txs)?;
                let mut conn = self.conn()?;
                let db_tx = conn.transaction()?;
                for user in &users {
                    db_tx.execute(
                        "DELETE FROM transactions WHERE user_id = ?",
                        params![user],
                    )?;
                }
                for (tx, sealed) in txs.iter().zip(&sealed) {
                    insert_sealed(&db_tx, tx, sealed)?;
                }
                db_tx.commit()?;
                info!(users = users.len(), rows = txs.len(), "Reloaded transactions");
                Ok(txs.len())
            }
        }
    }

    fn seal_all(&self, txs: &[NewTransaction]) -> Result<Vec<String>> {
        txs.iter()
            .map(|tx| self.cipher().encrypt(&tx.description))
            .collect()
    }
}
