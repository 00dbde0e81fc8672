use crate::domain::{Artist, Song};
use crate::dto::{ArtistInfo, SongInfo};
use crate::ports::ResumeKey;

/// Decides, row by row, what a chunked scan hands back to the client.
///
/// A rejected row still counts against the chunk and still moves the resume
/// key, so the next call never examines it again.
pub trait EntityFilter {
  type Row;
  type Info;

  fn accepts(&self, row: &Self::Row) -> Option<Self::Info>;
  fn extract_key(&self, row: &Self::Row) -> ResumeKey;
}

/// Filter for artist scans.
///
/// The search text is already applied by the query as a `name > text`
/// threshold, so every scanned artist is accepted. Free-text search over
/// artists is therefore alphabetical continuation from the text, not
/// substring matching.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtistSearchFilter;

impl EntityFilter for ArtistSearchFilter {
  type Row = Artist;
  type Info = ArtistInfo;

  fn accepts(&self, row: &Artist) -> Option<ArtistInfo> {
    Some(ArtistInfo::from(row))
  }

  fn extract_key(&self, row: &Artist) -> ResumeKey {
    ResumeKey::new(row.name.clone(), row.id)
  }
}

/// Filter for song scans; same continuation semantics as artists. Artist
/// names are resolved once per page, after filtering.
#[derive(Debug, Clone, Copy, Default)]
pub struct SongSearchFilter;

impl EntityFilter for SongSearchFilter {
  type Row = Song;
  type Info = SongInfo;

  fn accepts(&self, row: &Song) -> Option<SongInfo> {
    Some(SongInfo::from(row))
  }

  fn extract_key(&self, row: &Song) -> ResumeKey {
    ResumeKey::new(row.name.clone(), row.id)
  }
}
