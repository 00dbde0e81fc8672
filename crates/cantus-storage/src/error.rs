use thiserror::Error;

/// Failures opening or preparing the catalog database.
///
/// Once the store is open, per-operation failures are reported as
/// [`cantus_core::CoreError::Transaction`].
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("connection error: {0}")]
  Connection(#[from] diesel::ConnectionError),

  #[error("query error: {0}")]
  Query(#[from] diesel::result::Error),

  #[error("migration error: {0}")]
  Migration(String),

  #[error("unsupported journal mode {0:?}")]
  JournalMode(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("config error: {0}")]
  Config(#[from] cantus_config::ConfigError),
}
