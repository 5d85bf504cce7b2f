use thiserror::Error;

/// Faults raised by a datastore call.
///
/// A declined purchase is NOT an error: `try_purchase` returns `Ok(false)`.
/// Every variant here means the call itself could not complete.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    #[error("stock parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type InventoryResult<T> = Result<T, InventoryError>;
