//! Decomposes an absolute URL into its ordered path-prefix URLs (§4.2).

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum UrlError {
    #[error("not an absolute http(s) url: {0}")]
    NotAbsolute(String),
}

/// Returns the ordered list of `url`'s path prefixes, from least to most
/// specific, with the input URL itself as the last element.
///
/// `https://h/a/b/c` decomposes to `[https://h/a, https://h/a/b, https://h/a/b/c]`.
/// Query and fragment are discarded. A URL whose path has no segments
/// (a bare host) decomposes to the empty list — no upstream can be
/// registered for it.
pub fn sub_urls(url: &str) -> Result<Vec<String>, UrlError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| UrlError::NotAbsolute(url.to_string()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlError::NotAbsolute(url.to_string()));
    }

    let authority = format!(
        "{}://{}",
        parsed.scheme(),
        parsed.host_str().map(|h| match parsed.port() {
            Some(p) => format!("{h}:{p}"),
            None => h.to_string(),
        }).ok_or_else(|| UrlError::NotAbsolute(url.to_string()))?
    );

    let segments: Vec<&str> = parsed
        .path()
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let mut out = Vec::with_capacity(segments.len());
    for k in 1..=segments.len() {
        out.push(format!("{authority}/{}", segments[..k].join("/")));
    }
    Ok(out)
}

/// Finds the most specific prefix of `request_url` that equals
/// `identifier_url`, walking from most to least specific. Used by the
/// identifier matcher's `mode = first` so longer configured paths win.
pub fn longest_matching_prefix(request_url: &str, identifier_url: &str) -> Result<bool, UrlError> {
    let prefixes = sub_urls(request_url)?;
    Ok(prefixes.iter().rev().any(|p| p == identifier_url))
}
