use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

pub const DEFAULT_CHUNK_SIZE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
  /// Rows examined per free-text search call before answering the client.
  #[serde(default = "default_chunk_size")]
  pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
  DEFAULT_CHUNK_SIZE
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self { chunk_size: DEFAULT_CHUNK_SIZE }
  }
}

impl SearchConfig {
  pub fn with_chunk_size(chunk_size: usize) -> Self {
    Self { chunk_size }
  }

  pub fn validate(&self) -> Result<(), CoreError> {
    if self.chunk_size == 0 {
      return Err(CoreError::InvalidArgument("search chunk_size must be greater than zero".to_string()));
    }
    Ok(())
  }
}
