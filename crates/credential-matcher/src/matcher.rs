//! Key selection for a hostname or search term.

use crate::MatchKey;

/// How a page relates to a set of stored keys.
#[derive(Debug, PartialEq, Eq)]
pub enum MatchOutcome<'a> {
    /// Nothing matched.
    None,
    /// A key names the hostname exactly; fetch and fill without asking.
    Direct(&'a MatchKey),
    /// Pattern matches without an exact hit. All of them go to the user
    /// for selection; nothing is filled automatically.
    Ambiguous(Vec<&'a MatchKey>),
}

impl MatchOutcome<'_> {
    /// Number of keys that matched, for the badge.
    pub fn match_count(&self) -> usize {
        match self {
            MatchOutcome::None => 0,
            MatchOutcome::Direct(_) => 1,
            MatchOutcome::Ambiguous(keys) => keys.len(),
        }
    }
}

/// Keys whose regex or literal text is satisfied by `hostname`.
///
/// Result order follows `keys`. Keys that are not valid regexes only take
/// part in the literal test.
pub fn match_keys<'a>(hostname: &str, keys: &'a [MatchKey]) -> Vec<&'a MatchKey> {
    keys.iter().filter(|k| k.matches_host(hostname)).collect()
}

/// Keys satisfied by a page's hostname or, for URL patterns, its full URL.
pub fn match_page<'a>(hostname: &str, url: &str, keys: &'a [MatchKey]) -> Vec<&'a MatchKey> {
    keys.iter().filter(|k| k.matches_page(hostname, url)).collect()
}

/// Keys matching a manual search term.
pub fn match_search<'a>(term: &str, keys: &'a [MatchKey]) -> Vec<&'a MatchKey> {
    keys.iter().filter(|k| k.matches_search(term)).collect()
}

/// First key that names `hostname` exactly (modulo `www.`).
pub fn find_exact<'a>(hostname: &str, keys: &'a [MatchKey]) -> Option<&'a MatchKey> {
    keys.iter().find(|k| k.is_exact(hostname))
}

/// Decide between direct fill, user selection, or nothing.
///
/// An exact key wins even when other patterns also match. Exactness is
/// judged on the hostname alone.
pub fn classify<'a>(hostname: &str, url: &str, keys: &'a [MatchKey]) -> MatchOutcome<'a> {
    if let Some(exact) = find_exact(hostname, keys) {
        return MatchOutcome::Direct(exact);
    }
    let matched = match_page(hostname, url, keys);
    if matched.is_empty() {
        MatchOutcome::None
    } else {
        MatchOutcome::Ambiguous(matched)
    }
}
