mod campaigns;
mod sessions;
mod transactions;
mod users;

use std::str::FromStr;

use rusqlite::types::Type;

/// Parse a TEXT column into one of the shared enums.
fn parse_text<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
