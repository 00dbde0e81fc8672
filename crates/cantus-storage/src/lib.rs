pub mod config;
pub mod error;
pub mod models;
pub mod schema;

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use cantus_core::domain::{Artist, ArtistId, OwnerId, Song, SongId};
use cantus_core::errors::CoreError;
use cantus_core::ports::{CatalogStore, CatalogTx, EntityQuery, ScanBound};

pub use crate::config::StorageConfig;
pub use crate::error::StorageError;
use crate::models::{ArtistRow, NewArtistRow, NewArtistSynonymRow, NewSongRow, NewSongSynonymRow, SongRow};
use crate::schema::{artist_synonyms, artists, song_synonyms, songs};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const JOURNAL_MODES: [&str; 6] = ["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];

/// Ids bound per `IN (...)` list; stays below SQLite's variable limit even on
/// builds that keep the old 999 default.
const IN_LIST_CHUNK: usize = 500;

/// Catalog store backed by a single SQLite connection.
///
/// Units of work are serialized by the connection lock.
pub struct SqliteCatalogStore {
  conn: Mutex<SqliteConnection>,
}

impl SqliteCatalogStore {
  /// Opens (or creates) the database at `database_url` and brings its schema
  /// up to date. `":memory:"` gives a private throwaway database.
  pub fn new(database_url: &str, journal_mode: Option<&str>) -> Result<Self, StorageError> {
    let mut conn = SqliteConnection::establish(database_url)?;
    conn.batch_execute("PRAGMA foreign_keys = ON;")?;

    if let Some(mode) = journal_mode {
      let mode = mode.to_ascii_uppercase();
      if !JOURNAL_MODES.contains(&mode.as_str()) {
        return Err(StorageError::JournalMode(mode));
      }
      conn.batch_execute(&format!("PRAGMA journal_mode = {mode};"))?;
    }

    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| StorageError::Migration(e.to_string()))?;
    info!(database = database_url, migrations = applied.len(), "catalog store ready");

    Ok(Self { conn: Mutex::new(conn) })
  }

  pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
    if let Some(parent) = config.db_path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    Self::new(&config.db_path.to_string_lossy(), config.journal_mode.as_deref())
  }

  pub fn in_memory() -> Result<Self, StorageError> {
    Self::new(":memory:", None)
  }

  fn lock(&self) -> Result<MutexGuard<'_, SqliteConnection>, CoreError> {
    self.conn.lock().map_err(|_| CoreError::Transaction("catalog connection lock poisoned".to_string()))
  }
}

#[derive(Debug, thiserror::Error)]
enum TxError {
  #[error(transparent)]
  Diesel(#[from] diesel::result::Error),
  #[error(transparent)]
  Work(CoreError),
}

impl From<TxError> for CoreError {
  fn from(err: TxError) -> Self {
    match err {
      TxError::Diesel(e) => db_error(e),
      TxError::Work(e) => e,
    }
  }
}

fn db_error(e: diesel::result::Error) -> CoreError {
  CoreError::Transaction(e.to_string())
}

impl CatalogStore for SqliteCatalogStore {
  fn run_atomic<T, F>(&self, work: F) -> Result<T, CoreError>
  where
    F: FnOnce(&mut dyn CatalogTx) -> Result<T, CoreError>,
  {
    let mut conn = self.lock()?;
    let value = conn.transaction::<T, TxError, _>(|conn| work(&mut SqliteTx { conn }).map_err(TxError::Work))?;
    Ok(value)
  }

  fn read<T, F>(&self, work: F) -> Result<T, CoreError>
  where
    F: FnOnce(&mut dyn CatalogTx) -> Result<T, CoreError>,
  {
    let mut conn = self.lock()?;
    work(&mut SqliteTx { conn: &mut *conn })
  }
}

struct SqliteTx<'c> {
  conn: &'c mut SqliteConnection,
}

fn to_i64(n: u64) -> i64 {
  i64::try_from(n).unwrap_or(i64::MAX)
}

// Ids are stored as lowercase hyphenated UUIDs, whose text order matches
// `Uuid`'s byte order, so `(name, id)` compares the same in SQL and in Rust.
fn artists_matching(query: &EntityQuery) -> artists::BoxedQuery<'_, Sqlite> {
  let mut q = artists::table.filter(artists::owner_id.eq(query.owner.as_str())).into_boxed();
  match &query.after {
    Some(ScanBound::Name(text)) => q = q.filter(artists::name.gt(text.as_str())),
    Some(ScanBound::Key(key)) => {
      q = q.filter(
        artists::name
          .gt(key.name.as_str())
          .or(artists::name.eq(key.name.as_str()).and(artists::id.gt(key.id.to_string()))),
      )
    }
    None => {}
  }
  q
}

fn songs_matching(query: &EntityQuery) -> songs::BoxedQuery<'_, Sqlite> {
  let mut q = songs::table.filter(songs::owner_id.eq(query.owner.as_str())).into_boxed();
  match &query.after {
    Some(ScanBound::Name(text)) => q = q.filter(songs::name.gt(text.as_str())),
    Some(ScanBound::Key(key)) => {
      q = q.filter(
        songs::name.gt(key.name.as_str()).or(songs::name.eq(key.name.as_str()).and(songs::id.gt(key.id.to_string()))),
      )
    }
    None => {}
  }
  q
}

fn group_synonyms(pairs: Vec<(String, String)>) -> HashMap<String, BTreeSet<String>> {
  let mut grouped: HashMap<String, BTreeSet<String>> = HashMap::new();
  for (entity_id, name) in pairs {
    grouped.entry(entity_id).or_default().insert(name);
  }
  grouped
}

impl SqliteTx<'_> {
  fn attach_artist_synonyms(&mut self, rows: Vec<ArtistRow>) -> Result<Vec<Artist>, CoreError> {
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    let mut pairs = Vec::new();
    for chunk in ids.chunks(IN_LIST_CHUNK) {
      pairs.extend(
        artist_synonyms::table
          .filter(artist_synonyms::artist_id.eq_any(chunk.iter().copied()))
          .select((artist_synonyms::artist_id, artist_synonyms::name))
          .load::<(String, String)>(self.conn)
          .map_err(db_error)?,
      );
    }
    let mut synonyms = group_synonyms(pairs);

    rows
      .into_iter()
      .map(|row| {
        let names = synonyms.remove(&row.id).unwrap_or_default();
        row.into_artist(names)
      })
      .collect()
  }

  fn attach_song_synonyms(&mut self, rows: Vec<SongRow>) -> Result<Vec<Song>, CoreError> {
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    let mut pairs = Vec::new();
    for chunk in ids.chunks(IN_LIST_CHUNK) {
      pairs.extend(
        song_synonyms::table
          .filter(song_synonyms::song_id.eq_any(chunk.iter().copied()))
          .select((song_synonyms::song_id, song_synonyms::name))
          .load::<(String, String)>(self.conn)
          .map_err(db_error)?,
      );
    }
    let mut synonyms = group_synonyms(pairs);

    rows
      .into_iter()
      .map(|row| {
        let names = synonyms.remove(&row.id).unwrap_or_default();
        row.into_song(names)
      })
      .collect()
  }
}

impl CatalogTx for SqliteTx<'_> {
  fn count_artists(&mut self, query: &EntityQuery) -> Result<u64, CoreError> {
    let count: i64 = artists_matching(query).count().get_result(self.conn).map_err(db_error)?;
    Ok(count.unsigned_abs())
  }

  fn fetch_artists(&mut self, query: &EntityQuery) -> Result<Vec<Artist>, CoreError> {
    let mut q = artists_matching(query).order((artists::name.asc(), artists::id.asc()));
    if let Some(offset) = query.offset {
      q = q.offset(to_i64(offset));
    }
    if let Some(limit) = query.limit {
      q = q.limit(to_i64(limit));
    }
    let rows = q.load::<ArtistRow>(self.conn).map_err(db_error)?;
    self.attach_artist_synonyms(rows)
  }

  fn count_songs(&mut self, query: &EntityQuery) -> Result<u64, CoreError> {
    let count: i64 = songs_matching(query).count().get_result(self.conn).map_err(db_error)?;
    Ok(count.unsigned_abs())
  }

  fn fetch_songs(&mut self, query: &EntityQuery) -> Result<Vec<Song>, CoreError> {
    let mut q = songs_matching(query).order((songs::name.asc(), songs::id.asc()));
    if let Some(offset) = query.offset {
      q = q.offset(to_i64(offset));
    }
    if let Some(limit) = query.limit {
      q = q.limit(to_i64(limit));
    }
    let rows = q.load::<SongRow>(self.conn).map_err(db_error)?;
    self.attach_song_synonyms(rows)
  }

  fn find_artist(&mut self, artist_id: ArtistId) -> Result<Option<Artist>, CoreError> {
    let row = artists::table
      .filter(artists::id.eq(artist_id.to_string()))
      .first::<ArtistRow>(self.conn)
      .optional()
      .map_err(db_error)?;

    Ok(self.attach_artist_synonyms(row.into_iter().collect())?.pop())
  }

  fn find_artists(&mut self, ids: &[ArtistId]) -> Result<Vec<Artist>, CoreError> {
    let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
    let mut rows = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(IN_LIST_CHUNK) {
      rows.extend(artists::table.filter(artists::id.eq_any(chunk)).load::<ArtistRow>(self.conn).map_err(db_error)?);
    }
    self.attach_artist_synonyms(rows)
  }

  fn find_song(&mut self, song_id: SongId) -> Result<Option<Song>, CoreError> {
    let row = songs::table
      .filter(songs::id.eq(song_id.to_string()))
      .first::<SongRow>(self.conn)
      .optional()
      .map_err(db_error)?;

    Ok(self.attach_song_synonyms(row.into_iter().collect())?.pop())
  }

  fn save_artist(&mut self, artist: &Artist) -> Result<(), CoreError> {
    let row = NewArtistRow::from_artist(artist)?;

    diesel::insert_into(artists::table)
      .values(&row)
      .on_conflict(artists::id)
      .do_update()
      .set(&row)
      .execute(self.conn)
      .map_err(db_error)?;

    diesel::delete(artist_synonyms::table.filter(artist_synonyms::artist_id.eq(&row.id)))
      .execute(self.conn)
      .map_err(db_error)?;

    let synonyms: Vec<NewArtistSynonymRow<'_>> =
      artist.synonyms.iter().map(|name| NewArtistSynonymRow { artist_id: &row.id, name }).collect();
    if !synonyms.is_empty() {
      diesel::insert_into(artist_synonyms::table).values(&synonyms).execute(self.conn).map_err(db_error)?;
    }

    Ok(())
  }

  fn save_song(&mut self, song: &Song) -> Result<(), CoreError> {
    let row = NewSongRow::from_song(song)?;

    diesel::insert_into(songs::table)
      .values(&row)
      .on_conflict(songs::id)
      .do_update()
      .set(&row)
      .execute(self.conn)
      .map_err(db_error)?;

    diesel::delete(song_synonyms::table.filter(song_synonyms::song_id.eq(&row.id)))
      .execute(self.conn)
      .map_err(db_error)?;

    let synonyms: Vec<NewSongSynonymRow<'_>> =
      song.synonyms.iter().map(|name| NewSongSynonymRow { song_id: &row.id, name }).collect();
    if !synonyms.is_empty() {
      diesel::insert_into(song_synonyms::table).values(&synonyms).execute(self.conn).map_err(db_error)?;
    }

    Ok(())
  }

  fn delete_artist(&mut self, artist_id: ArtistId) -> Result<(), CoreError> {
    let id = artist_id.to_string();
    diesel::delete(artist_synonyms::table.filter(artist_synonyms::artist_id.eq(&id)))
      .execute(self.conn)
      .map_err(db_error)?;
    diesel::delete(artists::table.filter(artists::id.eq(&id))).execute(self.conn).map_err(db_error)?;
    Ok(())
  }

  fn delete_song(&mut self, song_id: SongId) -> Result<(), CoreError> {
    let id = song_id.to_string();
    diesel::delete(song_synonyms::table.filter(song_synonyms::song_id.eq(&id)))
      .execute(self.conn)
      .map_err(db_error)?;
    diesel::delete(songs::table.filter(songs::id.eq(&id))).execute(self.conn).map_err(db_error)?;
    Ok(())
  }

  fn reassign_songs(&mut self, owner: &OwnerId, from: ArtistId, to: Option<ArtistId>) -> Result<u64, CoreError> {
    let changed = diesel::update(
      songs::table.filter(songs::owner_id.eq(owner.as_str())).filter(songs::artist_id.eq(from.to_string())),
    )
    .set(songs::artist_id.eq(to.map(|id| id.to_string())))
    .execute(self.conn)
    .map_err(db_error)?;

    Ok(changed as u64)
  }

  fn songs_by_artist(&mut self, owner: &OwnerId, artist: ArtistId) -> Result<Vec<Song>, CoreError> {
    let rows = songs::table
      .filter(songs::owner_id.eq(owner.as_str()))
      .filter(songs::artist_id.eq(artist.to_string()))
      .order((songs::name.asc(), songs::id.asc()))
      .load::<SongRow>(self.conn)
      .map_err(db_error)?;
    self.attach_song_synonyms(rows)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use cantus_core::dto::SynonymUpdateData;
  use cantus_core::ports::ResumeKey;
  use cantus_core::search::{MediaSearchParameters, SearchConfig};
  use cantus_core::services::MediaService;
  use uuid::Uuid;

  fn owner() -> OwnerId {
    OwnerId::new("alice")
  }

  fn store() -> SqliteCatalogStore {
    SqliteCatalogStore::in_memory().unwrap()
  }

  fn save_artist(store: &SqliteCatalogStore, artist: Artist) -> ArtistId {
    let id = artist.id;
    store.run_atomic(|tx| tx.save_artist(&artist)).unwrap();
    id
  }

  fn save_song(store: &SqliteCatalogStore, song: Song) -> SongId {
    let id = song.id;
    store.run_atomic(|tx| tx.save_song(&song)).unwrap();
    id
  }

  #[test]
  fn artist_round_trips_with_synonyms() {
    let store = store();
    let mut artist = Artist::new(owner(), "Massive Attack");
    artist.synonyms.insert("Massive".to_string());
    artist.synonyms.insert("3D".to_string());
    let id = save_artist(&store, artist.clone());

    let loaded = store.read(|tx| tx.find_artist(id)).unwrap();

    assert_eq!(loaded, Some(artist));
  }

  #[test]
  fn saving_again_replaces_synonyms_and_fields() {
    let store = store();
    let mut artist = Artist::new(owner(), "Prince");
    artist.synonyms.insert("TAFKAP".to_string());
    save_artist(&store, artist.clone());

    artist.name = "Prince Rogers Nelson".to_string();
    artist.synonyms = BTreeSet::from(["Prince".to_string()]);
    let id = save_artist(&store, artist.clone());

    assert_eq!(store.read(|tx| tx.find_artist(id)).unwrap(), Some(artist));
  }

  #[test]
  fn song_upsert_can_clear_its_artist() {
    let store = store();
    let artist = save_artist(&store, Artist::new(owner(), "Blur"));
    let mut song = Song::new(owner(), "Song 2").by(artist);
    song.track_no = Some(2);
    let id = save_song(&store, song.clone());

    song.artist_id = None;
    save_song(&store, song.clone());

    assert_eq!(store.read(|tx| tx.find_song(id)).unwrap(), Some(song));
  }

  #[test]
  fn fetch_orders_by_name_then_id_and_honours_bounds() {
    let store = store();
    let low = Artist { id: ArtistId::from_uuid(Uuid::from_u128(1)), ..Artist::new(owner(), "Same") };
    let high = Artist { id: ArtistId::from_uuid(Uuid::from_u128(2)), ..Artist::new(owner(), "Same") };
    save_artist(&store, high.clone());
    save_artist(&store, low.clone());
    save_artist(&store, Artist::new(owner(), "Alpha"));
    save_artist(&store, Artist::new(OwnerId::new("bob"), "Zulu"));

    let all = store.read(|tx| tx.fetch_artists(&EntityQuery::owned_by(&owner()))).unwrap();
    let names: Vec<&str> = all.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Same", "Same"]);
    assert_eq!(all[1].id, low.id);

    let after_low = EntityQuery::owned_by(&owner()).after(ScanBound::Key(ResumeKey::new("Same", low.id)));
    let rest = store.read(|tx| tx.fetch_artists(&after_low)).unwrap();
    assert_eq!(rest.iter().map(|a| a.id).collect::<Vec<_>>(), vec![high.id]);

    let after_text = EntityQuery::owned_by(&owner()).after(ScanBound::Name("B".to_string()));
    assert_eq!(store.read(|tx| tx.count_artists(&after_text)).unwrap(), 2);
  }

  #[test]
  fn offset_without_limit_skips_rows() {
    let store = store();
    for name in ["A", "B", "C"] {
      save_artist(&store, Artist::new(owner(), name));
    }

    let rows = store.read(|tx| tx.fetch_artists(&EntityQuery::owned_by(&owner()).offset(1))).unwrap();

    assert_eq!(rows.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(), vec!["B", "C"]);
  }

  #[test]
  fn failed_unit_of_work_rolls_back() {
    let store = store();
    let artist = Artist::new(owner(), "Ghost");

    let err = store.run_atomic(|tx| {
      tx.save_artist(&artist)?;
      Err::<(), _>(CoreError::InvalidArgument("abort".to_string()))
    });

    assert!(matches!(err, Err(CoreError::InvalidArgument(_))));
    assert_eq!(store.read(|tx| tx.find_artist(artist.id)).unwrap(), None);
  }

  #[test]
  fn reassign_touches_only_the_owners_songs() {
    let store = store();
    let from = save_artist(&store, Artist::new(owner(), "From"));
    let to = save_artist(&store, Artist::new(owner(), "To"));
    let mine = save_song(&store, Song::new(owner(), "Mine").by(from));
    let theirs = save_song(&store, Song::new(OwnerId::new("bob"), "Theirs").by(from));

    let changed = store.run_atomic(|tx| tx.reassign_songs(&owner(), from, Some(to))).unwrap();

    assert_eq!(changed, 1);
    let (mine, theirs) =
      store.read(|tx| Ok((tx.find_song(mine)?, tx.find_song(theirs)?))).unwrap();
    assert_eq!(mine.and_then(|s| s.artist_id), Some(to));
    assert_eq!(theirs.and_then(|s| s.artist_id), Some(from));
  }

  #[test]
  fn deleting_an_artist_clears_remaining_song_references() {
    let store = store();
    let mut artist = Artist::new(owner(), "Gone");
    artist.synonyms.insert("Went".to_string());
    let id = save_artist(&store, artist);
    let song = save_song(&store, Song::new(OwnerId::new("bob"), "Orphan").by(id));

    store.run_atomic(|tx| tx.delete_artist(id)).unwrap();

    assert_eq!(store.read(|tx| tx.find_artist(id)).unwrap(), None);
    let song = store.read(|tx| tx.find_song(song)).unwrap();
    assert_eq!(song.and_then(|s| s.artist_id), None);
  }

  #[test]
  fn unlimited_searches_span_several_in_list_chunks() {
    let rows = IN_LIST_CHUNK * 2 + 37;
    let store = store();
    store
      .run_atomic(|tx| {
        for i in 0..rows {
          let mut artist = Artist::new(owner(), format!("Artist {i:05}"));
          artist.synonyms.insert(format!("Alias {i:05}"));
          tx.save_artist(&artist)?;
          tx.save_song(&Song::new(owner(), format!("Song {i:05}")).by(artist.id))?;
        }
        Ok(())
      })
      .unwrap();

    let artists = store.read(|tx| tx.fetch_artists(&EntityQuery::owned_by(&owner()))).unwrap();
    assert_eq!(artists.len(), rows);
    assert!(artists.iter().all(|a| a.synonyms.len() == 1));

    let service = MediaService::new(store, &SearchConfig::default()).unwrap();
    let artist_page = service.search_artists(&owner(), &MediaSearchParameters::paged(0, 0), None).unwrap();
    assert_eq!(artist_page.results.len(), rows);

    let song_page = service.search_songs(&owner(), &MediaSearchParameters::paged(0, 0), None).unwrap();
    assert_eq!(song_page.results.len(), rows);
    assert!(song_page.results.iter().all(|s| s.artist_name.is_some()));
  }

  #[test]
  fn unknown_journal_mode_is_rejected() {
    assert!(matches!(SqliteCatalogStore::new(":memory:", Some("yolo")), Err(StorageError::JournalMode(_))));
  }

  #[test]
  fn scan_over_sqlite_returns_120_artists_in_three_calls() {
    let store = store();
    store
      .run_atomic(|tx| {
        for i in 0..120 {
          tx.save_artist(&Artist::new(owner(), format!("Artist {i:03}")))?;
        }
        Ok(())
      })
      .unwrap();
    let service = MediaService::new(store, &SearchConfig::with_chunk_size(50)).unwrap();
    let params = MediaSearchParameters::text("A");

    let mut names = Vec::new();
    let mut cursor = None;
    let mut calls = 0;
    loop {
      let page = service.search_artists(&owner(), &params, cursor).unwrap();
      calls += 1;
      names.extend(page.results.into_iter().map(|a| a.name));
      if !page.cursor.has_more() {
        break;
      }
      cursor = Some(page.cursor);
    }

    assert_eq!(calls, 3);
    assert_eq!(names.len(), 120);
    assert!(names.windows(2).all(|w| w[0] < w[1]));
  }

  #[test]
  fn artist_merge_over_sqlite() {
    let store = store();
    let dest = save_artist(&store, Artist::new(owner(), "The Beatles"));
    let mut source = Artist::new(owner(), "Beatles");
    source.synonyms.insert("Fab Four".to_string());
    let src = save_artist(&store, source);
    let song = save_song(&store, Song::new(owner(), "Help!").by(src));
    let service = MediaService::new(store, &SearchConfig::default()).unwrap();

    let details = service.update_artist_synonyms(&owner(), dest, &SynonymUpdateData::merging([src])).unwrap();

    assert_eq!(details.synonyms, vec!["Beatles", "Fab Four"]);
    assert_eq!(details.songs.iter().map(|s| s.song_id).collect::<Vec<_>>(), vec![song]);
    assert!(matches!(service.fetch_artist_details(&owner(), src), Err(CoreError::NotFound { .. })));
  }
}
