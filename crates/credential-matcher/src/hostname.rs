//! Hostname normalisation.

use url::Url;

/// Strip one leading `www.` from a hostname.
///
/// A bare `www.` is returned unchanged.
pub fn clear_hostname(hostname: &str) -> &str {
    match hostname.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => rest,
        _ => hostname,
    }
}

/// What a query is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTarget {
    /// A page: its hostname with `www.` already stripped, and the full URL
    /// that URL-pattern keys are tested against.
    Host { host: String, url: String },
    /// Free text typed by the user.
    Manual(String),
}

impl SearchTarget {
    pub fn as_str(&self) -> &str {
        match self {
            SearchTarget::Host { host, .. } => host,
            SearchTarget::Manual(term) => term,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, SearchTarget::Manual(_))
    }
}

/// Interpret a page URL or user input.
///
/// Absolute URLs with a host yield [`SearchTarget::Host`]; anything else is a
/// manual search term.
pub fn search_target(input: &str) -> SearchTarget {
    let input = input.trim();
    match Url::parse(input) {
        Ok(url) => match url.host_str() {
            Some(host) => SearchTarget::Host {
                host: clear_hostname(host).to_string(),
                url: url.to_string(),
            },
            None => SearchTarget::Manual(input.to_string()),
        },
        Err(_) => SearchTarget::Manual(input.to_string()),
    }
}
