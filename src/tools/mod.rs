pub mod search;

pub use search::{results_to_chunk, HttpWebSearch, SearchResult, WebSearch, WEB_SEARCH_SOURCE};
