//! Popup search across the active secret directories.

use crate::output;
use crate::service::fetch_candidates;
use credential_matcher::{match_page, match_search, search_target, MatchKey, SearchTarget};
use extension_protocol::MatchCandidate;
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, warn};
use vault_kv_client::{VaultClient, VaultResult};

pub const NO_MATCH_FOR_PAGE: &str = "No matching key found for this page.";
pub const NO_MATCH_FOR_SEARCH: &str = "No matching key found for the search";

/// State of one query: what is searched and what was found so far.
#[derive(Debug)]
pub struct QueryContext {
    target: SearchTarget,
    matches: Vec<MatchCandidate>,
    warnings: Vec<String>,
    seen: HashSet<(String, String)>,
}

impl QueryContext {
    pub fn new(target: SearchTarget) -> Self {
        Self {
            target,
            matches: Vec::new(),
            warnings: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn target(&self) -> &SearchTarget {
        &self.target
    }

    /// Add a candidate unless the same entry already produced this username.
    pub fn push(&mut self, candidate: MatchCandidate) -> bool {
        let id = (
            candidate.secret.combined_key(),
            candidate.credentials.username.clone(),
        );
        if !self.seen.insert(id) {
            return false;
        }
        self.matches.push(candidate);
        true
    }

    pub fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    pub fn matches(&self) -> &[MatchCandidate] {
        &self.matches
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Badge text: the number of credential sets, or empty.
    pub fn badge_text(&self) -> String {
        match self.match_count() {
            0 => String::new(),
            n => n.to_string(),
        }
    }

    /// Message to show when nothing matched.
    pub fn empty_message(&self) -> Option<&'static str> {
        if self.match_count() > 0 {
            None
        } else if self.target.is_manual() {
            Some(NO_MATCH_FOR_SEARCH)
        } else {
            Some(NO_MATCH_FOR_PAGE)
        }
    }

    pub fn into_report(self) -> QueryReport {
        QueryReport {
            query: self.target.as_str().to_string(),
            manual: self.target.is_manual(),
            badge: self.badge_text(),
            message: self.empty_message().map(str::to_string),
            matches: self.matches,
            warnings: self.warnings,
        }
    }
}

/// Query result as printed by the CLI.
#[derive(Debug, Serialize)]
pub struct QueryReport {
    pub query: String,
    pub manual: bool,
    pub badge: String,
    pub matches: Vec<MatchCandidate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl fmt::Display for QueryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", output::heading(&format!("Matches for {}", self.query)))?;
        for candidate in &self.matches {
            let title = if candidate.credentials.title.is_empty() {
                candidate.secret.name.as_str()
            } else {
                candidate.credentials.title.as_str()
            };
            writeln!(f, "{}", title)?;
            writeln!(f, "{}", output::row("User", &candidate.credentials.username))?;
            writeln!(f, "{}", output::row("Entry", &candidate.secret.combined_key()))?;
            if !candidate.credentials.comment.is_empty() {
                writeln!(f, "{}", output::row("Comment", &candidate.credentials.comment))?;
            }
        }
        for warning in &self.warnings {
            writeln!(f, "Warning: {}", warning)?;
        }
        if let Some(message) = &self.message {
            writeln!(f, "{}", message)?;
        }
        Ok(())
    }
}

enum DirectoryResult {
    Unreadable,
    Found(Vec<MatchCandidate>),
}

async fn query_directory(
    client: &VaultClient,
    dir: &str,
    target: &SearchTarget,
) -> VaultResult<DirectoryResult> {
    let names = match client.list(dir).await {
        Ok(names) => names,
        Err(err) if err.is_not_found() => {
            debug!(dir = %dir, "Secret directory is empty");
            return Ok(DirectoryResult::Found(Vec::new()));
        }
        Err(err) => {
            warn!(dir = %dir, error = %err, "Unable to list secret directory");
            return Ok(DirectoryResult::Unreadable);
        }
    };

    let keys: Vec<MatchKey> = names.iter().map(|name| MatchKey::parse(name)).collect();
    let matched = match target {
        SearchTarget::Host { host, url } => match_page(host, url, &keys),
        SearchTarget::Manual(term) => match_search(term, &keys),
    };
    debug!(dir = %dir, keys = keys.len(), matched = matched.len(), "Matched keys");

    let mut candidates = Vec::new();
    for key in matched {
        candidates.extend(fetch_candidates(client, dir, key.storage_path()).await?);
    }
    Ok(DirectoryResult::Found(candidates))
}

/// Search every directory in `dirs` for `input` (a page URL or free text).
///
/// Directories are queried concurrently and all of them finish before the
/// results are merged in directory order. A directory that cannot be listed
/// adds a warning; a failed entry read fails the query.
pub async fn query_secrets(
    client: &VaultClient,
    dirs: &[String],
    input: &str,
) -> VaultResult<QueryContext> {
    let mut context = QueryContext::new(search_target(input));

    let results = join_all(
        dirs.iter()
            .map(|dir| query_directory(client, dir, context.target())),
    )
    .await;

    for (dir, result) in dirs.iter().zip(results) {
        match result? {
            DirectoryResult::Unreadable => {
                context.warn(format!("Unable to read {}... Try re-login", dir));
            }
            DirectoryResult::Found(candidates) => {
                for candidate in candidates {
                    context.push(candidate);
                }
            }
        }
    }

    info!(
        dirs = dirs.len(),
        matches = context.match_count(),
        manual = context.target().is_manual(),
        "Query finished"
    );
    Ok(context)
}
