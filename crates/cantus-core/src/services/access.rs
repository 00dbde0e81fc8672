use std::fmt::Display;

use crate::domain::{Artist, ArtistId, CatalogEntity, OwnerId, Song, SongId};
use crate::errors::CoreError;
use crate::ports::CatalogTx;

/// Resolves an entity for `owner`: `NotFound` if the ID does not resolve,
/// `Unauthorized` if it belongs to someone else.
fn check_owner<E: CatalogEntity>(found: Option<E>, owner: &OwnerId, id: impl Display) -> Result<E, CoreError> {
  match found {
    None => Err(CoreError::not_found(E::KIND, id)),
    Some(entity) if entity.owner() != owner => Err(CoreError::unauthorized(E::KIND, id)),
    Some(entity) => Ok(entity),
  }
}

pub(crate) fn find_and_check_artist(tx: &mut dyn CatalogTx, owner: &OwnerId, id: ArtistId) -> Result<Artist, CoreError> {
  check_owner(tx.find_artist(id)?, owner, id)
}

pub(crate) fn find_and_check_song(tx: &mut dyn CatalogTx, owner: &OwnerId, id: SongId) -> Result<Song, CoreError> {
  check_owner(tx.find_song(id)?, owner, id)
}
