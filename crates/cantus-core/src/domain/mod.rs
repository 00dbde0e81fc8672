pub mod artist;
pub mod ids;
pub mod song;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use artist::Artist;
pub use ids::{ArtistId, OwnerId, SongId};
pub use song::Song;

/// The kinds of owner-scoped records kept in a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
  Artist,
  Song,
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EntityKind::Artist => f.write_str("artist"),
      EntityKind::Song => f.write_str("song"),
    }
  }
}

/// Common shape of every record an owner keeps in the catalog.
pub trait CatalogEntity {
  const KIND: EntityKind;

  fn owner(&self) -> &OwnerId;
  fn name(&self) -> &str;
  fn synonyms(&self) -> &BTreeSet<String>;
  fn synonyms_mut(&mut self) -> &mut BTreeSet<String>;

  /// Adds a synonym name; returns `false` if it was already present.
  fn add_synonym(&mut self, name: &str) -> bool {
    self.synonyms_mut().insert(name.to_string())
  }

  /// Removes a synonym name; absent names are a no-op returning `false`.
  fn remove_synonym(&mut self, name: &str) -> bool {
    self.synonyms_mut().remove(name)
  }

  /// Absorbs another entity's identity: its synonyms and its primary name.
  fn absorb_synonyms_of(&mut self, other: &Self) {
    let names: Vec<String> =
      other.synonyms().iter().cloned().chain(std::iter::once(other.name().to_string())).collect();
    self.synonyms_mut().extend(names);
  }
}
