use std::collections::BTreeSet;

use diesel::prelude::*;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use cantus_core::domain::{Artist, ArtistId, OwnerId, Song, SongId};
use cantus_core::errors::CoreError;

use crate::schema::{artist_synonyms, artists, song_synonyms, songs};

#[derive(Debug, Queryable)]
#[diesel(table_name = artists)]
pub struct ArtistRow {
  pub id: String,
  pub owner_id: String,
  pub name: String,
  pub created_at: String,
}

impl ArtistRow {
  pub fn into_artist(self, synonyms: BTreeSet<String>) -> Result<Artist, CoreError> {
    Ok(Artist {
      id: ArtistId::from_uuid(parse_uuid(&self.id)?),
      owner: OwnerId::new(self.owner_id),
      name: self.name,
      created_at: parse_timestamp(&self.created_at)?,
      synonyms,
    })
  }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = artists)]
pub struct NewArtistRow<'a> {
  pub id: String,
  pub owner_id: &'a str,
  pub name: &'a str,
  pub created_at: String,
}

impl<'a> NewArtistRow<'a> {
  pub fn from_artist(artist: &'a Artist) -> Result<Self, CoreError> {
    Ok(Self {
      id: artist.id.to_string(),
      owner_id: artist.owner.as_str(),
      name: &artist.name,
      created_at: format_timestamp(artist.created_at)?,
    })
  }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = artist_synonyms)]
pub struct NewArtistSynonymRow<'a> {
  pub artist_id: &'a str,
  pub name: &'a str,
}

#[derive(Debug, Queryable)]
#[diesel(table_name = songs)]
pub struct SongRow {
  pub id: String,
  pub owner_id: String,
  pub name: String,
  pub created_at: String,
  pub duration_ms: Option<i64>,
  pub track_no: Option<i32>,
  pub play_count: i32,
  pub inception_year: Option<i32>,
  pub artist_id: Option<String>,
}

impl SongRow {
  pub fn into_song(self, synonyms: BTreeSet<String>) -> Result<Song, CoreError> {
    let artist_id = match self.artist_id.as_deref() {
      Some(raw) => Some(ArtistId::from_uuid(parse_uuid(raw)?)),
      None => None,
    };

    Ok(Song {
      id: SongId::from_uuid(parse_uuid(&self.id)?),
      owner: OwnerId::new(self.owner_id),
      name: self.name,
      created_at: parse_timestamp(&self.created_at)?,
      duration_ms: self.duration_ms,
      track_no: self.track_no,
      play_count: self.play_count,
      inception_year: self.inception_year,
      artist_id,
      synonyms,
    })
  }
}

// `treat_none_as_null`: an upsert of a song without artist must clear the
// column, not keep the old value.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = songs, treat_none_as_null = true)]
pub struct NewSongRow<'a> {
  pub id: String,
  pub owner_id: &'a str,
  pub name: &'a str,
  pub created_at: String,
  pub duration_ms: Option<i64>,
  pub track_no: Option<i32>,
  pub play_count: i32,
  pub inception_year: Option<i32>,
  pub artist_id: Option<String>,
}

impl<'a> NewSongRow<'a> {
  pub fn from_song(song: &'a Song) -> Result<Self, CoreError> {
    Ok(Self {
      id: song.id.to_string(),
      owner_id: song.owner.as_str(),
      name: &song.name,
      created_at: format_timestamp(song.created_at)?,
      duration_ms: song.duration_ms,
      track_no: song.track_no,
      play_count: song.play_count,
      inception_year: song.inception_year,
      artist_id: song.artist_id.map(|id| id.to_string()),
    })
  }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = song_synonyms)]
pub struct NewSongSynonymRow<'a> {
  pub song_id: &'a str,
  pub name: &'a str,
}

fn parse_uuid(raw: &str) -> Result<Uuid, CoreError> {
  Uuid::parse_str(raw).map_err(|e| CoreError::Transaction(format!("invalid uuid {raw:?} in DB: {e}")))
}

fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, CoreError> {
  OffsetDateTime::parse(raw, &Rfc3339).map_err(|e| CoreError::Transaction(format!("invalid timestamp {raw:?} in DB: {e}")))
}

fn format_timestamp(at: OffsetDateTime) -> Result<String, CoreError> {
  at.format(&Rfc3339).map_err(|e| CoreError::Transaction(format!("unformattable timestamp {at}: {e}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn song_row_round_trips_through_domain() {
    let owner = OwnerId::new("u1");
    let mut song = Song::new(owner, "Roads").by(ArtistId::new());
    song.duration_ms = Some(305_000);
    song.inception_year = Some(1994);

    let new_row = NewSongRow::from_song(&song).unwrap();
    let row = SongRow {
      id: new_row.id.clone(),
      owner_id: new_row.owner_id.to_string(),
      name: new_row.name.to_string(),
      created_at: new_row.created_at.clone(),
      duration_ms: new_row.duration_ms,
      track_no: new_row.track_no,
      play_count: new_row.play_count,
      inception_year: new_row.inception_year,
      artist_id: new_row.artist_id.clone(),
    };

    assert_eq!(row.into_song(BTreeSet::new()).unwrap(), song);
  }

  #[test]
  fn corrupt_ids_surface_as_transaction_errors() {
    let row = ArtistRow {
      id: "not-a-uuid".to_string(),
      owner_id: "u1".to_string(),
      name: "X".to_string(),
      created_at: "2024-01-01T00:00:00Z".to_string(),
    };

    assert!(matches!(row.into_artist(BTreeSet::new()), Err(CoreError::Transaction(_))));
  }
}
