//! Credential slot operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};

/// A username/secret pair held in a credential slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub username: String,
    pub secret: String,
}

impl Database {
    /// Read the credential stored for `service`.
    pub fn get_credential(&self, service: &str) -> DbResult<Option<StoredCredential>> {
        Ok(self
            .conn
            .query_row(
                "SELECT username, secret FROM credentials WHERE service = ?",
                [service],
                |row| {
                    Ok(StoredCredential {
                        username: row.get(0)?,
                        secret: row.get(1)?,
                    })
                },
            )
            .optional()?)
    }

    /// Store (or replace) the credential for `service`.
    pub fn set_credential(&self, service: &str, username: &str, secret: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO credentials (service, username, secret, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(service) DO UPDATE SET
                username = excluded.username,
                secret = excluded.secret,
                updated_at = excluded.updated_at
            "#,
            params![service, username, secret],
        )?;
        Ok(())
    }

    /// Remove the credential for `service`.
    pub fn clear_credential(&self, service: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM credentials WHERE service = ?", [service])?;
        Ok(rows_affected > 0)
    }
}
