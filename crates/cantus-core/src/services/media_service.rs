use std::collections::BTreeSet;

use crate::domain::{ArtistId, OwnerId};
use crate::dto::{ArtistInfo, ArtistNames, SongInfo};
use crate::errors::CoreError;
use crate::ports::{CatalogStore, CatalogTx, OwnerResolver};
use crate::search::{
  ArtistSearchFilter, MediaSearchParameters, SearchConfig, SearchCursor, SearchEngine, SearchResult, SongSearchFilter,
};

/// Entry point for clients of a catalog store.
///
/// Every operation resolves the caller's owner first and never touches
/// records of other owners.
pub struct MediaService<S>
where
  S: CatalogStore,
{
  store: S,
  engine: SearchEngine,
}

impl<S> MediaService<S>
where
  S: CatalogStore,
{
  pub fn new(store: S, config: &SearchConfig) -> Result<Self, CoreError> {
    Ok(Self { store, engine: SearchEngine::new(config)? })
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  // -------- SEARCH --------

  pub fn search_artists(
    &self,
    caller: &dyn OwnerResolver,
    params: &MediaSearchParameters,
    cursor: Option<SearchCursor>,
  ) -> Result<SearchResult<ArtistInfo>, CoreError> {
    let owner = caller.current_owner()?;
    self.store.read(|tx| self.engine.search(tx, &owner, params, cursor, &ArtistSearchFilter))
  }

  /// Song search; the artist name of every returned song is resolved in the
  /// same read.
  pub fn search_songs(
    &self,
    caller: &dyn OwnerResolver,
    params: &MediaSearchParameters,
    cursor: Option<SearchCursor>,
  ) -> Result<SearchResult<SongInfo>, CoreError> {
    let owner = caller.current_owner()?;
    self.store.read(|tx| {
      let mut page = self.engine.search(tx, &owner, params, cursor, &SongSearchFilter)?;
      let ids: BTreeSet<ArtistId> = page.results.iter().filter_map(|s| s.artist_id).collect();
      let names = owned_artist_names(tx, &owner, ids)?;
      for info in &mut page.results {
        names.resolve(info);
      }
      Ok(page)
    })
  }
}

/// Names of the given artists, restricted to those `owner` can see.
pub(crate) fn owned_artist_names(
  tx: &mut dyn CatalogTx,
  owner: &OwnerId,
  ids: impl IntoIterator<Item = ArtistId>,
) -> Result<ArtistNames, CoreError> {
  let ids: Vec<ArtistId> = ids.into_iter().collect();
  if ids.is_empty() {
    return Ok(ArtistNames::default());
  }
  let artists = tx.find_artists(&ids)?;
  Ok(ArtistNames::from_artists(artists.iter().filter(|a| &a.owner == owner)))
}
