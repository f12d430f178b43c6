//! Stored keys: storage path plus hostname pattern.

use crate::hostname::clear_hostname;
use crate::{MatcherError, MatcherResult};
use regex::Regex;
use tracing::debug;

/// A stored key, split into its two roles.
///
/// `storage_path` is the name exactly as listed by the server and is what
/// reads and writes use. `source` is that name with one level of
/// percent-encoding removed, which is the pattern text: keys written by the
/// add-key flow are stored encoded so that `/` and `\` survive the path.
#[derive(Debug, Clone)]
pub struct MatchKey {
    storage_path: String,
    source: String,
    pattern: Option<Regex>,
}

impl MatchKey {
    /// Build a key from a listed name. Never fails: a name that is not a
    /// valid regex keeps `pattern = None` and still matches literally.
    pub fn parse(raw: &str) -> Self {
        let source = urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string());

        let pattern = match Regex::new(&source) {
            Ok(regex) => Some(regex),
            Err(err) => {
                debug!(key = %raw, error = %err, "Stored key is not a valid regex, using literal match only");
                None
            }
        };

        Self {
            storage_path: raw.to_string(),
            source,
            pattern,
        }
    }

    /// Name to use when reading the entry from the server.
    pub fn storage_path(&self) -> &str {
        &self.storage_path
    }

    /// Pattern text (decoded name).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    /// Regex test or literal-substring test against a hostname.
    pub fn matches_host(&self, hostname: &str) -> bool {
        if self.source.is_empty() {
            return false;
        }
        let regex_hit = self
            .pattern
            .as_ref()
            .map(|p| p.is_match(hostname))
            .unwrap_or(false);
        regex_hit || hostname.contains(self.source.as_str())
    }

    /// Host test, or the key's regex against the full page URL.
    ///
    /// Keys added as URL patterns (`^https://example\.com.*`) only ever
    /// match through the URL.
    pub fn matches_page(&self, hostname: &str, url: &str) -> bool {
        self.matches_host(hostname)
            || self
                .pattern
                .as_ref()
                .is_some_and(|p| !self.source.is_empty() && p.is_match(url))
    }

    /// Regex test against a search term, or the term appearing in the key.
    pub fn matches_search(&self, term: &str) -> bool {
        if self.source.is_empty() || term.is_empty() {
            return false;
        }
        let regex_hit = self
            .pattern
            .as_ref()
            .map(|p| p.is_match(term))
            .unwrap_or(false);
        regex_hit || self.source.contains(term)
    }

    /// Key names this hostname exactly, ignoring a leading `www.` on both.
    pub fn is_exact(&self, hostname: &str) -> bool {
        !self.source.is_empty() && clear_hostname(hostname) == clear_hostname(&self.source)
    }
}

impl PartialEq for MatchKey {
    fn eq(&self, other: &Self) -> bool {
        self.storage_path == other.storage_path
    }
}

impl Eq for MatchKey {}

/// Check a URL pattern before it is stored as a new key.
pub fn validate_key_pattern(pattern: &str) -> MatcherResult<()> {
    if pattern.trim().is_empty() {
        return Err(MatcherError::EmptyPattern);
    }
    if pattern.starts_with("http://") || pattern.starts_with("https://") {
        return Err(MatcherError::UrlScheme);
    }
    Regex::new(pattern)?;
    Ok(())
}

/// Check a plain entry name (a hostname) before writing credentials to it.
pub fn validate_entry_name(name: &str) -> MatcherResult<()> {
    if name.is_empty() {
        return Err(MatcherError::EmptyName);
    }
    if name.contains('/') {
        return Err(MatcherError::SlashInName);
    }
    Ok(())
}

/// Name under which a new pattern key is stored.
///
/// One round of percent-encoding; the client adds the second round on the
/// wire and the server strips it again.
pub fn storage_name_for_pattern(pattern: &str) -> String {
    urlencoding::encode(pattern).into_owned()
}
