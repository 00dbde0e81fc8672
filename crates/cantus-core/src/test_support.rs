//! In-memory catalog double for service and engine tests.
//!
//! Every unit of work runs against a snapshot that is only kept if the work
//! succeeds, and every write is recorded in a journal so tests can assert the
//! order in which steps were committed.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::domain::{Artist, ArtistId, OwnerId, Song, SongId};
use crate::errors::CoreError;
use crate::ports::{CatalogStore, CatalogTx, EntityQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
  Begin,
  Commit,
  Rollback,
  SaveArtist(ArtistId),
  SaveSong(SongId),
  DeleteArtist(ArtistId),
  DeleteSong(SongId),
  ReassignSongs { from: ArtistId, to: Option<ArtistId> },
}

#[derive(Debug, Clone, Default)]
struct Tables {
  artists: BTreeMap<ArtistId, Artist>,
  songs: BTreeMap<SongId, Song>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryCatalog {
  tables: RefCell<Tables>,
  journal: RefCell<Vec<Call>>,
  fail_on: RefCell<Option<Call>>,
}

impl MemoryCatalog {
  /// `Artist 000`, `Artist 001`, ... all owned by `owner`.
  pub(crate) fn with_numbered_artists(owner: &OwnerId, count: usize) -> Self {
    let store = Self::default();
    for i in 0..count {
      store.insert_artist(Artist::new(owner.clone(), format!("Artist {i:03}")));
    }
    store
  }

  pub(crate) fn insert_artist(&self, artist: Artist) -> ArtistId {
    let id = artist.id;
    self.tables.borrow_mut().artists.insert(id, artist);
    id
  }

  pub(crate) fn insert_song(&self, song: Song) -> SongId {
    let id = song.id;
    self.tables.borrow_mut().songs.insert(id, song);
    id
  }

  pub(crate) fn artist(&self, id: ArtistId) -> Option<Artist> {
    self.tables.borrow().artists.get(&id).cloned()
  }

  pub(crate) fn song(&self, id: SongId) -> Option<Song> {
    self.tables.borrow().songs.get(&id).cloned()
  }

  pub(crate) fn journal(&self) -> Vec<Call> {
    self.journal.borrow().clone()
  }

  /// Makes the next write matching `call` fail with a transaction error.
  pub(crate) fn fail_on(&self, call: Call) {
    *self.fail_on.borrow_mut() = Some(call);
  }
}

impl CatalogStore for MemoryCatalog {
  fn run_atomic<T, F>(&self, work: F) -> Result<T, CoreError>
  where
    F: FnOnce(&mut dyn CatalogTx) -> Result<T, CoreError>,
  {
    self.journal.borrow_mut().push(Call::Begin);
    let mut working = self.tables.borrow().clone();

    let outcome = {
      let mut tx = MemoryTx { tables: &mut working, journal: &self.journal, fail_on: &self.fail_on };
      work(&mut tx)
    };

    match outcome {
      Ok(value) => {
        *self.tables.borrow_mut() = working;
        self.journal.borrow_mut().push(Call::Commit);
        Ok(value)
      }
      Err(err) => {
        self.journal.borrow_mut().push(Call::Rollback);
        Err(err)
      }
    }
  }

  fn read<T, F>(&self, work: F) -> Result<T, CoreError>
  where
    F: FnOnce(&mut dyn CatalogTx) -> Result<T, CoreError>,
  {
    let mut working = self.tables.borrow().clone();
    let mut tx = MemoryTx { tables: &mut working, journal: &self.journal, fail_on: &self.fail_on };
    work(&mut tx)
  }
}

struct MemoryTx<'a> {
  tables: &'a mut Tables,
  journal: &'a RefCell<Vec<Call>>,
  fail_on: &'a RefCell<Option<Call>>,
}

impl MemoryTx<'_> {
  fn record(&mut self, call: Call) -> Result<(), CoreError> {
    let mut fail_on = self.fail_on.borrow_mut();
    if fail_on.as_ref() == Some(&call) {
      fail_on.take();
      return Err(CoreError::Transaction(format!("injected failure on {call:?}")));
    }
    self.journal.borrow_mut().push(call);
    Ok(())
  }
}

fn page<T: Clone>(mut rows: Vec<T>, query: &EntityQuery, key: impl Fn(&T) -> (String, uuid::Uuid)) -> Vec<T> {
  rows.sort_by_key(&key);
  let offset = query.offset.unwrap_or(0) as usize;
  let limit = query.limit.map_or(usize::MAX, |l| l as usize);
  rows.into_iter().skip(offset).take(limit).collect()
}

impl CatalogTx for MemoryTx<'_> {
  fn count_artists(&mut self, query: &EntityQuery) -> Result<u64, CoreError> {
    Ok(self.fetch_artists(&query.unpaged())?.len() as u64)
  }

  fn fetch_artists(&mut self, query: &EntityQuery) -> Result<Vec<Artist>, CoreError> {
    let rows = self
      .tables
      .artists
      .values()
      .filter(|a| query.matches(&a.owner, &a.name, a.id.as_uuid()))
      .cloned()
      .collect();
    Ok(page(rows, query, |a: &Artist| (a.name.clone(), a.id.as_uuid())))
  }

  fn count_songs(&mut self, query: &EntityQuery) -> Result<u64, CoreError> {
    Ok(self.fetch_songs(&query.unpaged())?.len() as u64)
  }

  fn fetch_songs(&mut self, query: &EntityQuery) -> Result<Vec<Song>, CoreError> {
    let rows = self
      .tables
      .songs
      .values()
      .filter(|s| query.matches(&s.owner, &s.name, s.id.as_uuid()))
      .cloned()
      .collect();
    Ok(page(rows, query, |s: &Song| (s.name.clone(), s.id.as_uuid())))
  }

  fn find_artist(&mut self, id: ArtistId) -> Result<Option<Artist>, CoreError> {
    Ok(self.tables.artists.get(&id).cloned())
  }

  fn find_artists(&mut self, ids: &[ArtistId]) -> Result<Vec<Artist>, CoreError> {
    Ok(ids.iter().filter_map(|id| self.tables.artists.get(id).cloned()).collect())
  }

  fn find_song(&mut self, id: SongId) -> Result<Option<Song>, CoreError> {
    Ok(self.tables.songs.get(&id).cloned())
  }

  fn save_artist(&mut self, artist: &Artist) -> Result<(), CoreError> {
    self.record(Call::SaveArtist(artist.id))?;
    self.tables.artists.insert(artist.id, artist.clone());
    Ok(())
  }

  fn save_song(&mut self, song: &Song) -> Result<(), CoreError> {
    self.record(Call::SaveSong(song.id))?;
    self.tables.songs.insert(song.id, song.clone());
    Ok(())
  }

  fn delete_artist(&mut self, id: ArtistId) -> Result<(), CoreError> {
    self.record(Call::DeleteArtist(id))?;
    self.tables.artists.remove(&id);
    Ok(())
  }

  fn delete_song(&mut self, id: SongId) -> Result<(), CoreError> {
    self.record(Call::DeleteSong(id))?;
    self.tables.songs.remove(&id);
    Ok(())
  }

  fn reassign_songs(&mut self, owner: &OwnerId, from: ArtistId, to: Option<ArtistId>) -> Result<u64, CoreError> {
    self.record(Call::ReassignSongs { from, to })?;
    let mut changed = 0;
    for song in self.tables.songs.values_mut() {
      if &song.owner == owner && song.artist_id == Some(from) {
        song.artist_id = to;
        changed += 1;
      }
    }
    Ok(changed)
  }

  fn songs_by_artist(&mut self, owner: &OwnerId, artist: ArtistId) -> Result<Vec<Song>, CoreError> {
    let rows = self
      .tables
      .songs
      .values()
      .filter(|s| &s.owner == owner && s.artist_id == Some(artist))
      .cloned()
      .collect();
    Ok(page(rows, &EntityQuery::owned_by(owner), |s: &Song| (s.name.clone(), s.id.as_uuid())))
  }
}
