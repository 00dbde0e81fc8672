use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Artist, ArtistId, OwnerId, Song, SongId};
use crate::errors::CoreError;

/// Position in a `(name, id)` ordered scan.
///
/// The ID breaks ties between records sharing a name, so the order is total
/// and a resumed scan neither skips nor repeats rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResumeKey {
  pub name: String,
  pub id: Uuid,
}

impl ResumeKey {
  pub fn new(name: impl Into<String>, id: impl Into<Uuid>) -> Self {
    Self { name: name.into(), id: id.into() }
  }
}

/// Lower (exclusive) bound of a name-ordered query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanBound {
  /// `name > text`: the initial threshold of a free-text search.
  Name(String),
  /// `(name, id) > (key.name, key.id)`: continuation after a scanned row.
  Key(ResumeKey),
}

impl ScanBound {
  /// Whether a row with this name and id lies strictly after the bound.
  pub fn admits(&self, name: &str, id: Uuid) -> bool {
    match self {
      ScanBound::Name(text) => name > text.as_str(),
      ScanBound::Key(key) => (name, id) > (key.name.as_str(), key.id),
    }
  }
}

/// Owner-scoped query over one entity kind, always ordered by name, then id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
  pub owner: OwnerId,
  pub after: Option<ScanBound>,
  pub offset: Option<u64>,
  pub limit: Option<u64>,
}

impl EntityQuery {
  pub fn owned_by(owner: &OwnerId) -> Self {
    Self { owner: owner.clone(), after: None, offset: None, limit: None }
  }

  pub fn after(mut self, bound: ScanBound) -> Self {
    self.after = Some(bound);
    self
  }

  pub fn offset(mut self, offset: u64) -> Self {
    self.offset = Some(offset);
    self
  }

  pub fn limit(mut self, limit: u64) -> Self {
    self.limit = Some(limit);
    self
  }

  /// The same filter without offset and limit, as used by count queries.
  pub fn unpaged(&self) -> Self {
    Self { owner: self.owner.clone(), after: self.after.clone(), offset: None, limit: None }
  }

  /// Filter predicate (owner and bound) evaluated in memory.
  pub fn matches(&self, owner: &OwnerId, name: &str, id: Uuid) -> bool {
    &self.owner == owner && self.after.as_ref().is_none_or(|bound| bound.admits(name, id))
  }
}

/// Operations available inside one unit of work.
///
/// Implementations must apply owner scoping exactly as described by
/// [`EntityQuery`]; `find_*` lookups are unscoped so callers can tell
/// "not found" from "belongs to somebody else".
pub trait CatalogTx {
  fn count_artists(&mut self, query: &EntityQuery) -> Result<u64, CoreError>;
  fn fetch_artists(&mut self, query: &EntityQuery) -> Result<Vec<Artist>, CoreError>;
  fn count_songs(&mut self, query: &EntityQuery) -> Result<u64, CoreError>;
  fn fetch_songs(&mut self, query: &EntityQuery) -> Result<Vec<Song>, CoreError>;

  fn find_artist(&mut self, id: ArtistId) -> Result<Option<Artist>, CoreError>;
  fn find_artists(&mut self, ids: &[ArtistId]) -> Result<Vec<Artist>, CoreError>;
  fn find_song(&mut self, id: SongId) -> Result<Option<Song>, CoreError>;

  /// Inserts or replaces the record together with its synonym set.
  fn save_artist(&mut self, artist: &Artist) -> Result<(), CoreError>;
  fn save_song(&mut self, song: &Song) -> Result<(), CoreError>;

  /// Deletes the record and its synonyms.
  fn delete_artist(&mut self, id: ArtistId) -> Result<(), CoreError>;
  fn delete_song(&mut self, id: SongId) -> Result<(), CoreError>;

  /// Points every song of `owner` referencing `from` at `to` (or at no
  /// artist). Returns the number of songs changed.
  fn reassign_songs(&mut self, owner: &OwnerId, from: ArtistId, to: Option<ArtistId>) -> Result<u64, CoreError>;

  /// Songs of `owner` referencing `artist`, ordered by name.
  fn songs_by_artist(&mut self, owner: &OwnerId, artist: ArtistId) -> Result<Vec<Song>, CoreError>;
}

/// Port de persistencia del catálogo.
///
/// `run_atomic` es todo o nada: si `work` falla, no se persiste nada de lo
/// que hizo y el error se devuelve sin cambios.
pub trait CatalogStore {
  fn run_atomic<T, F>(&self, work: F) -> Result<T, CoreError>
  where
    F: FnOnce(&mut dyn CatalogTx) -> Result<T, CoreError>;

  /// Read-only unit of work. Stores without a cheaper read path just run
  /// it atomically.
  fn read<T, F>(&self, work: F) -> Result<T, CoreError>
  where
    F: FnOnce(&mut dyn CatalogTx) -> Result<T, CoreError>,
  {
    self.run_atomic(work)
  }
}
