use serde::{Deserialize, Serialize};

use crate::search::cursor::SearchCursor;

/// What the client asked for.
///
/// `search_text` selects the mode: `None` runs a paged query, `Some` a
/// chunked scan. `client_param` is echoed back untouched so asynchronous
/// clients can match responses to requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaSearchParameters {
  #[serde(default)]
  pub search_text: Option<String>,
  /// Offset of the first row; only honoured in paged mode.
  #[serde(default)]
  pub first_result: i32,
  /// Page size; `<= 0` means "everything".
  #[serde(default)]
  pub max_results: i32,
  #[serde(default)]
  pub client_param: Option<serde_json::Value>,
}

impl MediaSearchParameters {
  pub fn paged(first_result: i32, max_results: i32) -> Self {
    Self { first_result, max_results, ..Self::default() }
  }

  pub fn text(search_text: impl Into<String>) -> Self {
    Self { search_text: Some(search_text.into()), ..Self::default() }
  }

  pub fn with_max_results(mut self, max_results: i32) -> Self {
    self.max_results = max_results;
    self
  }

  pub fn with_client_param(mut self, value: serde_json::Value) -> Self {
    self.client_param = Some(value);
    self
  }
}

/// One page of results plus the cursor to continue from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult<T> {
  pub results: Vec<T>,
  pub cursor: SearchCursor,
  pub params: MediaSearchParameters,
}
