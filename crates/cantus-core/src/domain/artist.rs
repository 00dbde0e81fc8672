use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::ids::{ArtistId, OwnerId};
use crate::domain::{CatalogEntity, EntityKind};

/// Representa a un artista dentro del catálogo de un owner.
///
/// Los sinónimos son nombres alternativos fusionados en la identidad del
/// artista; las canciones lo referencian mediante
/// [`crate::domain::Song::artist_id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
  /// Identificador único del artista.
  pub id: ArtistId,

  /// Owner dueño de este registro.
  pub owner: OwnerId,

  /// Nombre principal (canónico) del artista.
  pub name: String,

  #[serde(with = "crate::time_serde")]
  pub created_at: OffsetDateTime,

  /// Variaciones conocidas del nombre.
  pub synonyms: BTreeSet<String>,
}

impl Artist {
  pub fn new(owner: OwnerId, name: impl Into<String>) -> Self {
    Self {
      id: ArtistId::new(),
      owner,
      name: name.into(),
      created_at: OffsetDateTime::now_utc(),
      synonyms: BTreeSet::new(),
    }
  }
}

impl CatalogEntity for Artist {
  const KIND: EntityKind = EntityKind::Artist;

  fn owner(&self) -> &OwnerId {
    &self.owner
  }

  fn name(&self) -> &str {
    &self.name
  }

  fn synonyms(&self) -> &BTreeSet<String> {
    &self.synonyms
  }

  fn synonyms_mut(&mut self) -> &mut BTreeSet<String> {
    &mut self.synonyms
  }
}
