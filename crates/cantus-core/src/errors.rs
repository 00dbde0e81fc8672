// crates/cantus-core/src/errors.rs
use thiserror::Error;

use crate::domain::EntityKind;

/// Error genérico del núcleo de Cantus.
///
/// Las capas superiores (backend, CLI, etc.) lo mapean a mensajes de
/// usuario; ninguna variante se reintenta automáticamente.
#[derive(Debug, Error)]
pub enum CoreError {
  /// The requested ID does not resolve in the store.
  #[error("{kind} {id} not found")]
  NotFound { kind: EntityKind, id: String },

  /// The entity exists but belongs to a different owner than the caller.
  #[error("{kind} {id} does not belong to the current owner")]
  Unauthorized { kind: EntityKind, id: String },

  #[error("no caller identity available")]
  Unauthenticated,

  /// Malformed or mismatched cursor, or any other argument the client got wrong.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// A store operation failed; the surrounding unit of work was rolled back.
  #[error("transaction failed: {0}")]
  Transaction(String),
}

impl CoreError {
  pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
    CoreError::NotFound { kind, id: id.to_string() }
  }

  pub fn unauthorized(kind: EntityKind, id: impl ToString) -> Self {
    CoreError::Unauthorized { kind, id: id.to_string() }
  }
}
