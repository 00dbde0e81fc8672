mod config;
mod infrastructure;

use std::io::{BufRead, Write};

use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use cantus_core::CoreError;
use cantus_core::domain::{ArtistId, SongId};
use cantus_core::dto::SynonymUpdateData;
use cantus_core::search::{MediaSearchParameters, SearchConfig, SearchCursor};
use cantus_core::services::MediaService;
use cantus_storage::SqliteCatalogStore;

pub use crate::config::{AppConfig, LogConfig};
use crate::infrastructure::identity::RequestIdentity;

/// Global application state: the catalog service over the SQLite store.
pub struct AppState {
  media: MediaService<SqliteCatalogStore>,
}

impl AppState {
  pub fn new(store: SqliteCatalogStore, search: &SearchConfig) -> Result<Self, CoreError> {
    Ok(Self { media: MediaService::new(store, search)? })
  }
}

/// One line of input: who is asking, and what.
#[derive(Debug, Deserialize)]
pub struct Envelope {
  #[serde(default)]
  pub owner: Option<String>,
  #[serde(flatten)]
  pub command: Command,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
  SearchArtists {
    #[serde(default)]
    params: MediaSearchParameters,
    #[serde(default)]
    cursor: Option<SearchCursor>,
  },
  SearchSongs {
    #[serde(default)]
    params: MediaSearchParameters,
    #[serde(default)]
    cursor: Option<SearchCursor>,
  },
  FetchArtistDetails {
    artist_id: ArtistId,
  },
  FetchSongDetails {
    song_id: SongId,
  },
  UpdateArtistSynonyms {
    artist_id: ArtistId,
    #[serde(default)]
    update: SynonymUpdateData<ArtistId>,
  },
  UpdateSongSynonyms {
    song_id: SongId,
    #[serde(default)]
    update: SynonymUpdateData<SongId>,
  },
  RemoveArtist {
    artist_id: ArtistId,
  },
  RemoveSong {
    song_id: SongId,
  },
}

fn error_kind(err: &CoreError) -> &'static str {
  match err {
    CoreError::NotFound { .. } => "not_found",
    CoreError::Unauthorized { .. } => "unauthorized",
    CoreError::Unauthenticated => "unauthenticated",
    CoreError::InvalidArgument(_) => "invalid_argument",
    CoreError::Transaction(_) => "transaction",
  }
}

fn failure(kind: &str, message: String) -> Value {
  json!({ "ok": false, "error": { "kind": kind, "message": message } })
}

fn respond<T: Serialize>(result: Result<T, CoreError>) -> Value {
  match result {
    Ok(value) => match serde_json::to_value(value) {
      Ok(value) => json!({ "ok": true, "result": value }),
      Err(e) => failure("internal", e.to_string()),
    },
    Err(e) => {
      warn!(kind = error_kind(&e), error = %e, "command rejected");
      failure(error_kind(&e), e.to_string())
    }
  }
}

/// Runs one command and renders its outcome as a response object.
pub fn dispatch(state: &AppState, envelope: Envelope) -> Value {
  let caller = RequestIdentity::new(envelope.owner);
  let media = &state.media;

  match envelope.command {
    Command::SearchArtists { params, cursor } => respond(media.search_artists(&caller, &params, cursor)),
    Command::SearchSongs { params, cursor } => respond(media.search_songs(&caller, &params, cursor)),
    Command::FetchArtistDetails { artist_id } => respond(media.fetch_artist_details(&caller, artist_id)),
    Command::FetchSongDetails { song_id } => respond(media.fetch_song_details(&caller, song_id)),
    Command::UpdateArtistSynonyms { artist_id, update } => {
      respond(media.update_artist_synonyms(&caller, artist_id, &update))
    }
    Command::UpdateSongSynonyms { song_id, update } => respond(media.update_song_synonyms(&caller, song_id, &update)),
    Command::RemoveArtist { artist_id } => respond(media.remove_artist(&caller, artist_id)),
    Command::RemoveSong { song_id } => respond(media.remove_song(&caller, song_id)),
  }
}

/// Parses one JSON request line and answers it. Malformed input (including a
/// cursor that is neither a paged nor a scan cursor) is an invalid argument.
pub fn handle_line(state: &AppState, line: &str) -> Value {
  match serde_json::from_str::<Envelope>(line) {
    Ok(envelope) => {
      debug!(command = ?envelope.command, "dispatching");
      dispatch(state, envelope)
    }
    Err(e) => {
      warn!(error = %e, "malformed request");
      failure("invalid_argument", format!("malformed request: {e}"))
    }
  }
}

fn init_tracing(log: &LogConfig) {
  let filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new(&log.level))
    .unwrap_or_else(|_| EnvFilter::new("info"));
  // stdout carries responses; logs go to stderr.
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// Serves JSON-lines requests from stdin until EOF.
pub fn run() -> anyhow::Result<()> {
  let config = AppConfig::load().context("failed to load configuration")?;
  init_tracing(&config.log);

  // --- Dependency Injection Phase ---

  // 1. Persistence Adapter (SQLite)
  let store = SqliteCatalogStore::from_config(&config.storage).context("failed to open catalog store")?;

  // 2. Service Wiring
  let state = AppState::new(store, &config.search).context("invalid search configuration")?;

  let stdin = std::io::stdin();
  let mut stdout = std::io::stdout().lock();
  for line in stdin.lock().lines() {
    let line = line.context("failed to read request")?;
    if line.trim().is_empty() {
      continue;
    }
    let response = handle_line(&state, &line);
    writeln!(stdout, "{response}").context("failed to write response")?;
    stdout.flush()?;
  }

  Ok(())
}
