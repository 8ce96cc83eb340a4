//! Business rules between the HTTP handlers and the database. Everything here
//! is synchronous; handlers run it on the blocking pool through [`blocking`].

pub mod campaigns;
pub mod transactions;
pub mod users;

use tracing::error;

use crate::error::ServiceError;

/// Run blocking service work (SQLite, argon2) off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ServiceError::Internal(anyhow::Error::new(e))
    })?
}

/// Collect the names of required fields that are blank.
fn require(fields: &[(&str, &str)]) -> Vec<String> {
    fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| format!("{} is required", name))
        .collect()
}
