//! Synonym edits and entity merges.
//!
//! Merging an entity into another turns the source's name and synonyms into
//! synonyms of the destination and deletes the source. For artists the
//! source's songs are first moved to the destination in a separate unit of
//! work, so that no song is left pointing at a deleted artist.

use tracing::info;

use crate::domain::{ArtistId, CatalogEntity, SongId};
use crate::dto::{ArtistDetailInfo, SongDetailInfo, SynonymUpdateData};
use crate::errors::CoreError;
use crate::ports::{CatalogStore, OwnerResolver};
use crate::services::MediaService;
use crate::services::access::{find_and_check_artist, find_and_check_song};
use crate::services::media_service::owned_artist_names;

fn reject_self_merge<I: Ord + std::fmt::Display>(target: &I, update: &SynonymUpdateData<I>) -> Result<(), CoreError> {
  if update.new_synonym_ids.contains(target) {
    return Err(CoreError::InvalidArgument(format!("{target} cannot be merged into itself")));
  }
  Ok(())
}

impl<S> MediaService<S>
where
  S: CatalogStore,
{
  /// Removes synonyms from `artist_id` and merges the artists listed in
  /// `new_synonym_ids` into it.
  ///
  /// Runs as two units of work: songs are reassigned first and that step
  /// stays committed even if the second one (synonym copy + deletion) fails.
  pub fn update_artist_synonyms(
    &self,
    caller: &dyn OwnerResolver,
    artist_id: ArtistId,
    update: &SynonymUpdateData<ArtistId>,
  ) -> Result<ArtistDetailInfo, CoreError> {
    let owner = caller.current_owner()?;
    reject_self_merge(&artist_id, update)?;

    if !update.new_synonym_ids.is_empty() {
      let moved = self.store().run_atomic(|tx| {
        find_and_check_artist(tx, &owner, artist_id)?;
        let mut moved = 0;
        for &source in &update.new_synonym_ids {
          find_and_check_artist(tx, &owner, source)?;
          moved += tx.reassign_songs(&owner, source, Some(artist_id))?;
        }
        Ok(moved)
      })?;
      info!(%owner, artist = %artist_id, sources = update.new_synonym_ids.len(), moved, "songs reassigned for artist merge");
    }

    let details = self.store().run_atomic(|tx| {
      let mut target = find_and_check_artist(tx, &owner, artist_id)?;
      for name in &update.remove_synonyms {
        target.remove_synonym(name);
      }
      for &source_id in &update.new_synonym_ids {
        let source = find_and_check_artist(tx, &owner, source_id)?;
        target.absorb_synonyms_of(&source);
        tx.delete_artist(source_id)?;
      }
      tx.save_artist(&target)?;

      let songs = tx.songs_by_artist(&owner, artist_id)?;
      Ok(ArtistDetailInfo::new(&target, &songs))
    })?;

    info!(
      %owner,
      artist = %artist_id,
      merged = update.new_synonym_ids.len(),
      removed = update.remove_synonyms.len(),
      "artist synonyms updated"
    );
    Ok(details)
  }

  /// Same as [`Self::update_artist_synonyms`] for songs. Nothing references
  /// a song, so there is a single unit of work.
  pub fn update_song_synonyms(
    &self,
    caller: &dyn OwnerResolver,
    song_id: SongId,
    update: &SynonymUpdateData<SongId>,
  ) -> Result<SongDetailInfo, CoreError> {
    let owner = caller.current_owner()?;
    reject_self_merge(&song_id, update)?;

    let details = self.store().run_atomic(|tx| {
      let mut target = find_and_check_song(tx, &owner, song_id)?;
      for name in &update.remove_synonyms {
        target.remove_synonym(name);
      }
      for &source_id in &update.new_synonym_ids {
        let source = find_and_check_song(tx, &owner, source_id)?;
        target.absorb_synonyms_of(&source);
        tx.delete_song(source_id)?;
      }
      tx.save_song(&target)?;

      let names = owned_artist_names(tx, &owner, target.artist_id)?;
      Ok(SongDetailInfo::new(&target, &names))
    })?;

    info!(
      %owner,
      song = %song_id,
      merged = update.new_synonym_ids.len(),
      removed = update.remove_synonyms.len(),
      "song synonyms updated"
    );
    Ok(details)
  }
}
