use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tower_sessions::SessionStore;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, Error};

use crowdfund_db::Database;

/// Admin session records kept in the application database, so a session
/// deleted at logout is gone for every copy of its cookie.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Remove expired records. Returns how many were dropped.
    pub async fn purge_expired(&self) -> session_store::Result<usize> {
        let db = self.db.clone();
        run(move || db.delete_expired_sessions(chrono::Utc::now().timestamp())).await
    }
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

async fn run<F, T>(f: F) -> session_store::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Backend(e.to_string()))?
        .map_err(|e| Error::Backend(format!("{:#}", e)))
}

fn encode(record: &Record) -> session_store::Result<String> {
    serde_json::to_string(record).map_err(|e| Error::Encode(e.to_string()))
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        loop {
            let data = encode(record)?;
            let id = record.id.to_string();
            let expiry = record.expiry_date.unix_timestamp();
            let db = self.db.clone();
            if run(move || db.create_session(&id, &data, expiry)).await? {
                return Ok(());
            }
            record.id = Id::default();
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let data = encode(record)?;
        let id = record.id.to_string();
        let expiry = record.expiry_date.unix_timestamp();
        let db = self.db.clone();
        run(move || db.save_session(&id, &data, expiry)).await
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let id = session_id.to_string();
        let db = self.db.clone();
        let data = run(move || db.load_session(&id, chrono::Utc::now().timestamp())).await?;
        data.map(|raw| serde_json::from_str(&raw).map_err(|e| Error::Decode(e.to_string())))
            .transpose()
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        let id = session_id.to_string();
        let db = self.db.clone();
        run(move || db.delete_session(&id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use time::{Duration, OffsetDateTime};

    fn record(expires_in: Duration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::from([("admin".to_string(), serde_json::json!({ "userID": 1 }))]),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn records_round_trip_until_deleted() {
        let store = SqliteStore::new(Arc::new(Database::open_in_memory().unwrap()));
        let mut rec = record(Duration::hours(1));
        store.create(&mut rec).await.unwrap();

        let loaded = store.load(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded.data, rec.data);

        store.delete(&rec.id).await.unwrap();
        assert!(store.load(&rec.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_records_do_not_load() {
        let store = SqliteStore::new(Arc::new(Database::open_in_memory().unwrap()));
        let rec = record(Duration::hours(-1));
        store.save(&rec).await.unwrap();

        assert!(store.load(&rec.id).await.unwrap().is_none());
        assert_eq!(store.purge_expired().await.unwrap(), 1);
    }
}
