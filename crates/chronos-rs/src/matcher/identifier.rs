//! Finds the registered identifier an inbound call should route to, and
//! detects conflicts at registration time (§4.1).

use crate::matcher::url::sub_urls;
use crate::models::identifier::{Identifier, Method};

/// Whether [`find`] should stop at the first (most specific) match, or
/// collect every identifier that would also match — the latter is only
/// used for conflict detection at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    First,
    All,
}

fn matches_extra(candidate: &Identifier, extra: &str) -> bool {
    candidate.extra == extra
}

fn matches_method(candidate: &Identifier, method: Method, mode: MatchMode) -> bool {
    if method == candidate.method {
        return true;
    }
    if candidate.method == Method::Any {
        return true;
    }
    if method == Method::Any && mode == MatchMode::All {
        return true;
    }
    false
}

/// Returns the identifiers from `registered` that match (url, method,
/// extra) under the §4.1 rules.
///
/// In [`MatchMode::First`], prefixes of `url` are walked from most to least
/// specific and the search stops at the first identifier whose url equals
/// one of them, so the single longest-prefix match is returned. In
/// [`MatchMode::All`], every matching identifier is collected regardless of
/// specificity — used only to build the conflict list at registration.
pub fn find<'a>(
    registered: impl IntoIterator<Item = &'a Identifier>,
    url: &str,
    method: Method,
    extra: &str,
    mode: MatchMode,
) -> Vec<&'a Identifier> {
    let candidates: Vec<&Identifier> = registered
        .into_iter()
        .filter(|id| matches_extra(id, extra) && matches_method(id, method, mode))
        .collect();

    if candidates.is_empty() {
        return Vec::new();
    }

    let prefixes = match sub_urls(url) {
        Ok(p) => p,
        Err(_) => return Vec::new(),
    };

    match mode {
        MatchMode::First => {
            // Most specific (longest) prefix first.
            for prefix in prefixes.iter().rev() {
                if let Some(hit) = candidates.iter().find(|id| &id.url == prefix) {
                    return vec![hit];
                }
            }
            Vec::new()
        }
        MatchMode::All => candidates
            .into_iter()
            .filter(|id| prefixes.iter().any(|p| p == &id.url))
            .collect(),
    }
}

/// Returns the already-registered identifiers that would also match
/// `candidate` under §4.1 — i.e. what `find(candidate.url, candidate.method,
/// candidate.extra, mode=All)` returns. An upstream must not be registered
/// while this list is non-empty.
pub fn conflicts_with<'a>(
    registered: impl IntoIterator<Item = &'a Identifier>,
    candidate: &Identifier,
) -> Vec<&'a Identifier> {
    find(
        registered,
        &candidate.url,
        candidate.method,
        &candidate.extra,
        MatchMode::All,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(url: &str, method: Method, extra: &str) -> Identifier {
        Identifier {
            url: url.to_string(),
            method,
            extra: extra.to_string(),
        }
    }

    #[test]
    fn longest_prefix_wins_in_first_mode() {
        let a = id("http://h/a", Method::Get, "");
        let b = id("http://h/a/b", Method::Get, "");
        let registered = vec![a.clone(), b.clone()];
        let hits = find(&registered, "http://h/a/b/c", Method::Get, "", MatchMode::First);
        assert_eq!(hits, vec![&b]);
    }

    #[test]
    fn any_method_identifier_matches_every_method() {
        let wild = id("http://h/a", Method::Any, "");
        let registered = vec![wild.clone()];
        let hits = find(&registered, "http://h/a", Method::Post, "", MatchMode::First);
        assert_eq!(hits, vec![&wild]);
    }

    #[test]
    fn extra_disambiguates_identical_url_and_method() {
        let x = id("http://h/a", Method::Get, "x");
        let y = id("http://h/a", Method::Get, "y");
        let registered = vec![x.clone(), y.clone()];
        let hits = find(&registered, "http://h/a", Method::Get, "y", MatchMode::First);
        assert_eq!(hits, vec![&y]);
    }

    #[test]
    fn no_match_returns_empty() {
        let registered = vec![id("http://h/a", Method::Get, "")];
        let hits = find(&registered, "http://h/z", Method::Get, "", MatchMode::First);
        assert!(hits.is_empty());
    }

    #[test]
    fn conflicts_with_finds_overlap_under_any() {
        let existing = id("http://h/a", Method::Any, "");
        let registered = vec![existing.clone()];
        let candidate = id("http://h/a", Method::Get, "");
        let conflicts = conflicts_with(&registered, &candidate);
        assert_eq!(conflicts, vec![&existing]);
    }

    #[test]
    fn conflicts_with_is_symmetric() {
        let a = id("http://h/a", Method::Any, "");
        let b = id("http://h/a", Method::Get, "");

        // Registering b after a: does a conflict with b?
        let registered_a = vec![a.clone()];
        let a_conflicts_with_b = !conflicts_with(&registered_a, &b).is_empty();

        // Registering a after b: does b conflict with a?
        let registered_b = vec![b.clone()];
        let b_conflicts_with_a = !conflicts_with(&registered_b, &a).is_empty();

        assert_eq!(a_conflicts_with_b, b_conflicts_with_a);
        assert!(a_conflicts_with_b);
    }

    #[test]
    fn different_extras_do_not_conflict() {
        let existing = id("http://h/a", Method::Get, "x");
        let registered = vec![existing];
        let candidate = id("http://h/a", Method::Get, "y");
        assert!(conflicts_with(&registered, &candidate).is_empty());
    }

    #[test]
    fn exact_duplicate_conflicts_with_itself() {
        let existing = id("http://h/a", Method::Get, "");
        let registered = vec![existing.clone()];
        let candidate = existing.clone();
        assert_eq!(conflicts_with(&registered, &candidate), vec![&existing]);
    }
}
