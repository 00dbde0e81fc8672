use tracing::debug;

use crate::domain::{Artist, CatalogEntity, OwnerId, Song};
use crate::errors::CoreError;
use crate::ports::{CatalogTx, EntityQuery, ScanBound};
use crate::search::config::SearchConfig;
use crate::search::cursor::{Paging, ScanScope, ScanState, SearchCursor};
use crate::search::filter::EntityFilter;
use crate::search::params::{MediaSearchParameters, SearchResult};

/// An entity kind the engine can count and scan.
pub trait ScanSource: CatalogEntity + Sized {
  fn count(tx: &mut dyn CatalogTx, query: &EntityQuery) -> Result<u64, CoreError>;
  fn fetch(tx: &mut dyn CatalogTx, query: &EntityQuery) -> Result<Vec<Self>, CoreError>;
}

impl ScanSource for Artist {
  fn count(tx: &mut dyn CatalogTx, query: &EntityQuery) -> Result<u64, CoreError> {
    tx.count_artists(query)
  }

  fn fetch(tx: &mut dyn CatalogTx, query: &EntityQuery) -> Result<Vec<Self>, CoreError> {
    tx.fetch_artists(query)
  }
}

impl ScanSource for Song {
  fn count(tx: &mut dyn CatalogTx, query: &EntityQuery) -> Result<u64, CoreError> {
    tx.count_songs(query)
  }

  fn fetch(tx: &mut dyn CatalogTx, query: &EntityQuery) -> Result<Vec<Self>, CoreError> {
    tx.fetch_songs(query)
  }
}

/// Picks and runs one of the two search algorithms for a request.
#[derive(Debug, Clone)]
pub struct SearchEngine {
  chunk_size: usize,
}

impl SearchEngine {
  pub fn new(config: &SearchConfig) -> Result<Self, CoreError> {
    config.validate()?;
    Ok(Self { chunk_size: config.chunk_size })
  }

  /// Runs one search step for the filter's entity kind.
  ///
  /// `cursor` is whatever the client sent back from its previous call; it is
  /// ignored in paged mode.
  pub fn search<F>(
    &self,
    tx: &mut dyn CatalogTx,
    owner: &OwnerId,
    params: &MediaSearchParameters,
    cursor: Option<SearchCursor>,
    filter: &F,
  ) -> Result<SearchResult<F::Info>, CoreError>
  where
    F: EntityFilter,
    F::Row: ScanSource,
    for<'a> F::Info: From<&'a F::Row>,
  {
    match params.search_text.as_deref() {
      None => self.full_search::<F>(tx, owner, params),
      Some(text) => self.chunk_search(tx, owner, params, text, cursor, filter),
    }
  }

  fn full_search<F>(
    &self,
    tx: &mut dyn CatalogTx,
    owner: &OwnerId,
    params: &MediaSearchParameters,
  ) -> Result<SearchResult<F::Info>, CoreError>
  where
    F: EntityFilter,
    F::Row: ScanSource,
    for<'a> F::Info: From<&'a F::Row>,
  {
    let base = EntityQuery::owned_by(owner);
    let record_count = <F::Row as ScanSource>::count(tx, &base)?;

    let mut query = base;
    if params.first_result > 0 {
      query = query.offset(u64::from(params.first_result.unsigned_abs()));
    }
    if params.max_results > 0 {
      query = query.limit(u64::from(params.max_results.unsigned_abs()));
    }
    let rows = <F::Row as ScanSource>::fetch(tx, &query)?;

    let paging = Paging::compute(params.first_result, params.max_results, record_count);
    let kind = <F::Row as CatalogEntity>::KIND;
    debug!(
      %kind,
      record_count,
      rows = rows.len(),
      page = paging.current_page,
      pages = paging.page_count,
      "paged search"
    );

    Ok(SearchResult {
      results: rows.iter().map(|row| <F::Info as From<&F::Row>>::from(row)).collect(),
      cursor: SearchCursor::Paged {
        position: u64::from(params.first_result.max(0).unsigned_abs()),
        record_count,
        paging,
      },
      params: params.clone(),
    })
  }

  fn chunk_search<F>(
    &self,
    tx: &mut dyn CatalogTx,
    owner: &OwnerId,
    params: &MediaSearchParameters,
    text: &str,
    cursor: Option<SearchCursor>,
    filter: &F,
  ) -> Result<SearchResult<F::Info>, CoreError>
  where
    F: EntityFilter,
    F::Row: ScanSource,
  {
    let mut state = self.initialize_scan::<F::Row>(tx, owner, text, cursor)?;

    let bound = match state.resume_key() {
      Some(key) => ScanBound::Key(key.clone()),
      None => ScanBound::Name(text.to_string()),
    };
    let query = EntityQuery::owned_by(owner).after(bound).limit(self.chunk_size as u64);
    let chunk = <F::Row as ScanSource>::fetch(tx, &query)?;

    let quota = if params.max_results > 0 { params.max_results.unsigned_abs() as usize } else { usize::MAX };
    let mut results = Vec::new();
    let mut rows = chunk.iter();
    let mut last = None;
    let mut examined = 0usize;

    while results.len() < quota {
      let Some(row) = rows.next() else { break };
      examined += 1;
      last = Some(row);
      if let Some(info) = filter.accepts(row) {
        results.push(info);
      }
    }

    state.set_has_more(examined < chunk.len() || chunk.len() >= self.chunk_size);
    // Nothing examined: keep the previous key so the cursor does not fall
    // back to the start of the scan.
    if let Some(row) = last {
      state.set_resume_key(filter.extract_key(row));
    }

    let kind = <F::Row as CatalogEntity>::KIND;
    debug!(
      %kind,
      fetched = chunk.len(),
      examined,
      accepted = results.len(),
      position = state.position(),
      has_more = state.has_more(),
      "chunk search step"
    );

    Ok(SearchResult { results, cursor: SearchCursor::Scan(state), params: params.clone() })
  }

  /// New scan (count query scoped by owner and text) when the client has no
  /// usable cursor, otherwise the client's cursor advanced by one chunk.
  fn initialize_scan<E: ScanSource>(
    &self,
    tx: &mut dyn CatalogTx,
    owner: &OwnerId,
    text: &str,
    cursor: Option<SearchCursor>,
  ) -> Result<ScanState, CoreError> {
    let scope = ScanScope { kind: E::KIND, search_text: text.to_string() };

    match SearchCursor::into_scan(cursor, &scope)? {
      Some(state) => Ok(state.resume(self.chunk_size)),
      None => {
        let count_query = EntityQuery::owned_by(owner).after(ScanBound::Name(text.to_string()));
        let record_count = E::count(tx, &count_query)?;
        Ok(ScanState::new_scan(scope, record_count))
      }
    }
  }
}
