use tracing::info;

use crate::domain::{ArtistId, SongId};
use crate::dto::{ArtistDetailInfo, SongDetailInfo};
use crate::errors::CoreError;
use crate::ports::{CatalogStore, OwnerResolver};
use crate::services::MediaService;
use crate::services::access::{find_and_check_artist, find_and_check_song};
use crate::services::media_service::owned_artist_names;

impl<S> MediaService<S>
where
  S: CatalogStore,
{
  // -------- QUERY (read) --------

  pub fn fetch_artist_details(&self, caller: &dyn OwnerResolver, id: ArtistId) -> Result<ArtistDetailInfo, CoreError> {
    let owner = caller.current_owner()?;
    self.store().read(|tx| {
      let artist = find_and_check_artist(tx, &owner, id)?;
      let songs = tx.songs_by_artist(&owner, id)?;
      Ok(ArtistDetailInfo::new(&artist, &songs))
    })
  }

  pub fn fetch_song_details(&self, caller: &dyn OwnerResolver, id: SongId) -> Result<SongDetailInfo, CoreError> {
    let owner = caller.current_owner()?;
    self.store().read(|tx| {
      let song = find_and_check_song(tx, &owner, id)?;
      let names = owned_artist_names(tx, &owner, song.artist_id)?;
      Ok(SongDetailInfo::new(&song, &names))
    })
  }

  // -------- REMOVAL --------

  /// Detaches the artist's songs (first unit of work), then deletes the
  /// artist and its synonyms (second unit of work).
  pub fn remove_artist(&self, caller: &dyn OwnerResolver, id: ArtistId) -> Result<(), CoreError> {
    let owner = caller.current_owner()?;

    let detached = self.store().run_atomic(|tx| {
      find_and_check_artist(tx, &owner, id)?;
      tx.reassign_songs(&owner, id, None)
    })?;

    self.store().run_atomic(|tx| {
      find_and_check_artist(tx, &owner, id)?;
      tx.delete_artist(id)
    })?;

    info!(%owner, artist = %id, detached, "artist removed");
    Ok(())
  }

  pub fn remove_song(&self, caller: &dyn OwnerResolver, id: SongId) -> Result<(), CoreError> {
    let owner = caller.current_owner()?;
    self.store().run_atomic(|tx| {
      find_and_check_song(tx, &owner, id)?;
      tx.delete_song(id)
    })?;

    info!(%owner, song = %id, "song removed");
    Ok(())
  }
}
