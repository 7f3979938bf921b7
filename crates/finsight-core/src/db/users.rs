//! User operations

use rusqlite::{params, ErrorCode, OptionalExtension};
use tracing::info;

use super::Database;
use crate::crypto::generate_key;
use crate::error::{Error, Result};
use crate::models::User;

impl Database {
    /// Register a user with a fresh per-user key sealed under the global key
    ///
    /// The per-user key is stored only; descriptions are always encrypted with
    /// the global key.
    pub fn register_user(&self, user_id: &str, email: &str) -> Result<()> {
        if user_id.trim().is_empty() || email.trim().is_empty() {
            return Err(Error::Validation(
                "user_id and email are required".to_string(),
            ));
        }

        let sealed_key = self.cipher().encrypt_bytes(&generate_key())?;
        let conn = self.conn()?;
        let result = conn.execute(
            "INSERT INTO users (user_id, email, encrypted_key) VALUES (?, ?, ?)",
            params![user_id, email, sealed_key],
        );

        match result {
            Ok(_) => {
                info!(user_id, "Registered user");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(Error::Validation(format!(
                    "User '{}' or email '{}' already exists",
                    user_id, email
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT user_id, email FROM users WHERE user_id = ?",
                params![user_id],
                |row| {
                    Ok(User {
                        user_id: row.get(0)?,
                        email: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT user_id, email FROM users ORDER BY user_id")?;
        let users = stmt
            .query_map([], |row| {
                Ok(User {
                    user_id: row.get(0)?,
                    email: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Unseal a user's stored key. Fails with `Decryption` under the wrong global key.
    pub fn user_key(&self, user_id: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn()?;
        let sealed: Option<String> = conn
            .query_row(
                "SELECT encrypted_key FROM users WHERE user_id = ?",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;

        sealed
            .map(|s| self.cipher().decrypt_bytes(&s))
            .transpose()
    }
}
