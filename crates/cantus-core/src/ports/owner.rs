use crate::domain::OwnerId;
use crate::errors::CoreError;

/// Port que resuelve quién está llamando.
///
/// La autenticación vive fuera de Cantus; los adaptadores fallan con
/// [`CoreError::Unauthenticated`] cuando la petición no trae identidad.
pub trait OwnerResolver {
  fn current_owner(&self) -> Result<OwnerId, CoreError>;
}

/// A known owner resolves to itself.
impl OwnerResolver for OwnerId {
  fn current_owner(&self) -> Result<OwnerId, CoreError> {
    Ok(self.clone())
  }
}
