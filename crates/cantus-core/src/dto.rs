//! Transport objects handed to clients.
//!
//! Every DTO is built by an explicit mapping from its domain entity, so a
//! renamed or retyped field is a compile error instead of a silently
//! skipped property.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::{Artist, ArtistId, CatalogEntity, Song, SongId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistInfo {
  pub artist_id: ArtistId,
  pub name: String,
  #[serde(with = "crate::time_serde")]
  pub created_at: OffsetDateTime,
}

impl From<&Artist> for ArtistInfo {
  fn from(artist: &Artist) -> Self {
    Self { artist_id: artist.id, name: artist.name.clone(), created_at: artist.created_at }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongInfo {
  pub song_id: SongId,
  pub name: String,
  #[serde(with = "crate::time_serde")]
  pub created_at: OffsetDateTime,
  pub duration_ms: Option<i64>,
  pub track_no: Option<i32>,
  pub play_count: i32,
  pub inception_year: Option<i32>,
  pub artist_id: Option<ArtistId>,
  pub artist_name: Option<String>,
}

impl SongInfo {
  /// Converts a song, resolving its artist against `names`.
  ///
  /// An artist reference that does not resolve is dropped entirely: the
  /// client never sees an ID it cannot display.
  pub fn from_song(song: &Song, names: &ArtistNames) -> Self {
    let mut info = Self::from(song);
    names.resolve(&mut info);
    info
  }
}

/// Unresolved conversion: `artist_id` is copied, `artist_name` stays empty
/// until [`ArtistNames::resolve`] runs.
impl From<&Song> for SongInfo {
  fn from(song: &Song) -> Self {
    Self {
      song_id: song.id,
      name: song.name.clone(),
      created_at: song.created_at,
      duration_ms: song.duration_ms,
      track_no: song.track_no,
      play_count: song.play_count,
      inception_year: song.inception_year,
      artist_id: song.artist_id,
      artist_name: None,
    }
  }
}

/// Artist names already loaded for a batch of songs.
#[derive(Debug, Default, Clone)]
pub struct ArtistNames(HashMap<ArtistId, String>);

impl ArtistNames {
  pub fn from_artists<'a>(artists: impl IntoIterator<Item = &'a Artist>) -> Self {
    Self(artists.into_iter().map(|a| (a.id, a.name.clone())).collect())
  }

  pub fn get(&self, id: ArtistId) -> Option<&str> {
    self.0.get(&id).map(String::as_str)
  }

  pub fn resolve(&self, info: &mut SongInfo) {
    match info.artist_id.and_then(|id| self.get(id)) {
      Some(name) => info.artist_name = Some(name.to_string()),
      None => {
        info.artist_id = None;
        info.artist_name = None;
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistDetailInfo {
  #[serde(flatten)]
  pub artist: ArtistInfo,
  pub synonyms: Vec<String>,
  pub songs: Vec<SongInfo>,
}

impl ArtistDetailInfo {
  pub fn new(artist: &Artist, songs: &[Song]) -> Self {
    let names = ArtistNames::from_artists([artist]);
    Self {
      artist: ArtistInfo::from(artist),
      synonyms: synonym_names(artist),
      songs: songs.iter().map(|s| SongInfo::from_song(s, &names)).collect(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongDetailInfo {
  #[serde(flatten)]
  pub song: SongInfo,
  pub synonyms: Vec<String>,
}

impl SongDetailInfo {
  pub fn new(song: &Song, names: &ArtistNames) -> Self {
    Self { song: SongInfo::from_song(song, names), synonyms: synonym_names(song) }
  }
}

/// Changes to apply to an entity's synonyms.
///
/// `new_synonym_ids` names whole entities that are merged into the target
/// and then deleted; `remove_synonyms` drops plain synonym names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymUpdateData<I: Ord> {
  #[serde(default)]
  pub remove_synonyms: BTreeSet<String>,
  #[serde(default)]
  pub new_synonym_ids: BTreeSet<I>,
}

impl<I: Ord> Default for SynonymUpdateData<I> {
  fn default() -> Self {
    Self { remove_synonyms: BTreeSet::new(), new_synonym_ids: BTreeSet::new() }
  }
}

impl<I: Ord> SynonymUpdateData<I> {
  pub fn merging(ids: impl IntoIterator<Item = I>) -> Self {
    Self { remove_synonyms: BTreeSet::new(), new_synonym_ids: ids.into_iter().collect() }
  }

  pub fn removing<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
    self.remove_synonyms.extend(names.into_iter().map(Into::into));
    self
  }
}

fn synonym_names<E: CatalogEntity>(entity: &E) -> Vec<String> {
  entity.synonyms().iter().cloned().collect()
}
