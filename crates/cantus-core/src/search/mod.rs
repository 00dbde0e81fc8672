//! Dual-mode search over an owner's catalog.
//!
//! Without search text a request is answered by one offset/limit query
//! ([`SearchEngine`] "paged" mode). With search text the engine scans the
//! catalog in name order, one chunk per call, and hands the client a
//! [`SearchCursor`] to resume from.

pub mod config;
pub mod cursor;
pub mod engine;
pub mod filter;
pub mod params;

pub use config::SearchConfig;
pub use cursor::{Paging, ScanScope, ScanState, SearchCursor};
pub use engine::{ScanSource, SearchEngine};
pub use filter::{ArtistSearchFilter, EntityFilter, SongSearchFilter};
pub use params::{MediaSearchParameters, SearchResult};
