use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::ids::{ArtistId, OwnerId, SongId};
use crate::domain::{CatalogEntity, EntityKind};

/// La Canción (Song) tal como la guarda un owner en su catálogo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
  /// Identificador único de la canción dentro del sistema.
  pub id: SongId,
  pub owner: OwnerId,
  /// El título de la canción.
  pub name: String,
  #[serde(with = "crate::time_serde")]
  pub created_at: OffsetDateTime,
  /// Duración en milisegundos.
  pub duration_ms: Option<i64>,
  pub track_no: Option<i32>,
  pub play_count: i32,
  pub inception_year: Option<i32>,
  /// Artista intérprete; `None` si se desconoce o fue eliminado.
  pub artist_id: Option<ArtistId>,
  pub synonyms: BTreeSet<String>,
}

impl Song {
  pub fn new(owner: OwnerId, name: impl Into<String>) -> Self {
    Self {
      id: SongId::new(),
      owner,
      name: name.into(),
      created_at: OffsetDateTime::now_utc(),
      duration_ms: None,
      track_no: None,
      play_count: 0,
      inception_year: None,
      artist_id: None,
      synonyms: BTreeSet::new(),
    }
  }

  pub fn by(mut self, artist: ArtistId) -> Self {
    self.artist_id = Some(artist);
    self
  }
}

impl CatalogEntity for Song {
  const KIND: EntityKind = EntityKind::Song;

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
