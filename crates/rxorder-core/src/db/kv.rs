//! Key/value record operations.

use rusqlite::{params, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use super::{Database, DbResult};

impl Database {
    /// Read and decode the JSON record stored under `key`.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }

    /// Replace the record stored under `key`.
    pub fn put_value<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, json],
        )?;
        Ok(())
    }

    /// Delete the record stored under `key`.
    pub fn delete_value(&self, key: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?", [key])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Record {
        name: String,
        count: u32,
    }

    #[test]
    fn test_missing_key_is_none() {
        let db = Database::open_in_memory().unwrap();
        let value: Option<Record> = db.get_value("missing").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let db = Database::open_in_memory().unwrap();
        db.put_value("k", &Record { name: "a".into(), count: 1 }).unwrap();
        db.put_value("k", &Record { name: "b".into(), count: 2 }).unwrap();

        let value: Record = db.get_value("k").unwrap().unwrap();
        assert_eq!(value, Record { name: "b".into(), count: 2 });
    }

    #[test]
    fn test_delete_value() {
        let db = Database::open_in_memory().unwrap();
        db.put_value("k", &1u32).unwrap();

        assert!(db.delete_value("k").unwrap());
        assert!(!db.delete_value("k").unwrap());
        assert!(db.get_value::<u32>("k").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO kv_store (key, value) VALUES ('k', 'not json')",
                [],
            )
            .unwrap();

        assert!(db.get_value::<Record>("k").is_err());
    }
}
