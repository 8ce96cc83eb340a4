use anyhow::Result;
use rusqlite::OptionalExtension;

use crate::Database;

/// Web session records. `data` is an opaque serialized record and
/// `expiry_date` a unix timestamp; expired rows are never returned.
impl Database {
    pub fn save_session(&self, id: &str, data: &str, expiry_date: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, data, expiry_date) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET data = excluded.data, expiry_date = excluded.expiry_date",
                rusqlite::params![id, data, expiry_date],
            )?;
            Ok(())
        })
    }

    /// Insert a new session record, returning `false` if the id is taken.
    pub fn create_session(&self, id: &str, data: &str, expiry_date: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO sessions (id, data, expiry_date) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO NOTHING",
                rusqlite::params![id, data, expiry_date],
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn load_session(&self, id: &str, now: i64) -> Result<Option<String>> {
        self.with_conn(|conn| {
            let data = conn
                .query_row(
                    "SELECT data FROM sessions WHERE id = ?1 AND expiry_date > ?2",
                    rusqlite::params![id, now],
                    |r| r.get(0),
                )
                .optional()?;
            Ok(data)
        })
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Drop every session that expired at or before `now`.
    pub fn delete_expired_sessions(&self, now: i64) -> Result<usize> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM sessions WHERE expiry_date <= ?1", [now])?))
    }
}
