//! URL decomposition and identifier matching (§4.1, §4.2).

pub mod identifier;
pub mod url;

pub use identifier::{conflicts_with, find, MatchMode};
pub use url::{sub_urls, UrlError};
