use cantus_config::{CONFIG_BACKEND, ConfigBackend, ConfigError, TomlConfigBackend};
use cantus_core::search::SearchConfig;
use cantus_storage::StorageConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
  /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
  pub level: String,
}

impl Default for LogConfig {
  fn default() -> Self {
    LogConfig { level: "info".to_string() }
  }
}

/// Every config section the service reads at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub storage: StorageConfig,
  pub search: SearchConfig,
  pub log: LogConfig,
}

impl AppConfig {
  pub fn load() -> Result<Self, ConfigError> {
    Self::load_from(&CONFIG_BACKEND)
  }

  /// Loads each section (defaults when absent) and writes it back so the file
  /// documents the effective values.
  pub fn load_from(backend: &TomlConfigBackend) -> Result<Self, ConfigError> {
    let storage = StorageConfig::load_from(backend)?;

    let search: SearchConfig = backend.load_section_with_default("search")?;
    search
      .validate()
      .map_err(|e| ConfigError::Invalid { section: "search", key: "chunk_size", reason: e.to_string() })?;
    backend.save_section("search", &search)?;

    let log: LogConfig = backend.load_section_with_default("log")?;
    backend.save_section("log", &log)?;

    Ok(AppConfig { storage, search, log })
  }
}
