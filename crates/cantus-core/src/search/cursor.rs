use serde::{Deserialize, Serialize};

use crate::domain::EntityKind;
use crate::errors::CoreError;
use crate::ports::ResumeKey;

/// Page coordinates reported by a paged search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
  pub current_page: u32,
  pub page_count: u32,
}

impl Paging {
  /// `page_count = ceil(count / max_results)` and
  /// `current_page = max(first_result, 0) / max_results`; an unlimited page
  /// (`max_results <= 0`) is the single page `0` of `1`.
  pub fn compute(first_result: i32, max_results: i32, record_count: u64) -> Self {
    if max_results <= 0 {
      return Self { current_page: 0, page_count: 1 };
    }

    let size = u64::from(max_results.unsigned_abs());
    let first = u64::from(first_result.max(0).unsigned_abs());
    Self { current_page: saturating_u32(first / size), page_count: saturating_u32(record_count.div_ceil(size)) }
  }
}

fn saturating_u32(value: u64) -> u32 {
  u32::try_from(value).unwrap_or(u32::MAX)
}

/// The entity kind and search text a scan cursor was created for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanScope {
  pub kind: EntityKind,
  pub search_text: String,
}

/// Progress of a chunked free-text scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanState {
  scope: ScanScope,
  #[serde(default)]
  resume_key: Option<ResumeKey>,
  position: u64,
  record_count: u64,
  has_more: bool,
}

impl ScanState {
  /// Fresh scan: nothing examined yet, more data assumed.
  pub fn new_scan(scope: ScanScope, record_count: u64) -> Self {
    Self { scope, resume_key: None, position: 0, record_count, has_more: true }
  }

  /// Continues a scan one chunk further. The resume key is left as is until
  /// the next chunk has been examined.
  pub fn resume(mut self, chunk_size: usize) -> Self {
    self.position = self.position.saturating_add(chunk_size as u64);
    self
  }

  pub fn resume_key(&self) -> Option<&ResumeKey> {
    self.resume_key.as_ref()
  }

  pub fn position(&self) -> u64 {
    self.position
  }

  pub fn record_count(&self) -> u64 {
    self.record_count
  }

  pub fn has_more(&self) -> bool {
    self.has_more
  }

  pub(crate) fn set_resume_key(&mut self, key: ResumeKey) {
    self.resume_key = Some(key);
  }

  pub(crate) fn set_has_more(&mut self, has_more: bool) {
    self.has_more = has_more;
  }
}

/// Opaque continuation token handed to the client.
///
/// Clients store it and send it back unchanged; only the two variants below
/// can be produced by deserialization, which is what makes a foreign cursor
/// detectable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SearchCursor {
  /// Result of a paged query. Further pages are requested by offset, so it
  /// never reports more data.
  Paged { position: u64, record_count: u64, paging: Paging },
  Scan(ScanState),
}

impl SearchCursor {
  pub fn position(&self) -> u64 {
    match self {
      SearchCursor::Paged { position, .. } => *position,
      SearchCursor::Scan(state) => state.position,
    }
  }

  pub fn record_count(&self) -> u64 {
    match self {
      SearchCursor::Paged { record_count, .. } => *record_count,
      SearchCursor::Scan(state) => state.record_count,
    }
  }

  pub fn has_more(&self) -> bool {
    match self {
      SearchCursor::Paged { .. } => false,
      SearchCursor::Scan(state) => state.has_more,
    }
  }

  /// Page coordinates; scans are not page-addressable.
  pub fn paging(&self) -> Option<Paging> {
    match self {
      SearchCursor::Paged { paging, .. } => Some(*paging),
      SearchCursor::Scan(_) => None,
    }
  }

  pub fn resume_key(&self) -> Option<&ResumeKey> {
    match self {
      SearchCursor::Paged { .. } => None,
      SearchCursor::Scan(state) => state.resume_key(),
    }
  }

  /// Validates a client cursor for continuing the scan described by `scope`.
  ///
  /// Returns `None` when a new scan has to be started (no cursor, or a cursor
  /// that never examined a row).
  pub fn into_scan(cursor: Option<SearchCursor>, scope: &ScanScope) -> Result<Option<ScanState>, CoreError> {
    let state = match cursor {
      None => return Ok(None),
      Some(SearchCursor::Scan(state)) => state,
      Some(SearchCursor::Paged { .. }) => {
        return Err(CoreError::InvalidArgument("unsupported search cursor: paged cursor passed to a text search".to_string()));
      }
    };

    if &state.scope != scope {
      return Err(CoreError::InvalidArgument(format!(
        "search cursor belongs to a {} search for {:?}, not a {} search for {:?}",
        state.scope.kind, state.scope.search_text, scope.kind, scope.search_text
      )));
    }

    Ok(state.resume_key.is_some().then_some(state))
  }
}
