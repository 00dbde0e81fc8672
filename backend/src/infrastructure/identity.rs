use cantus_core::CoreError;
use cantus_core::domain::OwnerId;
use cantus_core::ports::OwnerResolver;

/// Caller identity as carried by one command envelope.
///
/// Authentication happens upstream; this only refuses requests that arrive
/// without an owner.
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity {
  owner: Option<String>,
}

impl RequestIdentity {
  pub fn new(owner: Option<String>) -> Self {
    Self { owner }
  }
}

impl OwnerResolver for RequestIdentity {
  fn current_owner(&self) -> Result<OwnerId, CoreError> {
    match self.owner.as_deref().map(str::trim) {
      Some(owner) if !owner.is_empty() => Ok(OwnerId::new(owner)),
      _ => Err(CoreError::Unauthenticated),
    }
  }
}
