//! Page-load auto-fill: decide whether to fill, offer a choice, or do nothing.

use crate::service::fetch_candidates;
use credential_matcher::{classify, search_target, MatchKey, MatchOutcome, SearchTarget, SecretRef};
use extension_protocol::MatchCandidate;
use futures_util::future::join_all;
use tracing::{debug, info, warn};
use vault_kv_client::{VaultClient, VaultResult};

/// Badge shown when any stored key matches the page.
pub const MATCH_BADGE: &str = "*";

#[derive(Debug, PartialEq, Eq)]
pub enum AutoFillDecision {
    Nothing,
    /// One credential set under a key naming the host exactly.
    Fill(MatchCandidate),
    /// Several candidates, or pattern-only matches: the user picks.
    Choose(Vec<MatchCandidate>),
}

#[derive(Debug)]
pub struct AutoFillPlan {
    pub host: Option<String>,
    /// Keys matching the host by pattern, literal text or exact name.
    pub match_count: usize,
    pub decision: AutoFillDecision,
}

impl AutoFillPlan {
    fn nothing(host: Option<String>) -> Self {
        Self {
            host,
            match_count: 0,
            decision: AutoFillDecision::Nothing,
        }
    }

    pub fn badge_text(&self) -> Option<&'static str> {
        (self.match_count > 0).then_some(MATCH_BADGE)
    }
}

#[derive(Default)]
struct DirectoryMatches {
    exact: Vec<SecretRef>,
    patterns: Vec<SecretRef>,
    count: usize,
}

async fn match_directory(client: &VaultClient, dir: &str, host: &str, url: &str) -> DirectoryMatches {
    let names = match client.list_or_empty(dir).await {
        Ok(names) => names,
        Err(err) => {
            warn!(dir = %dir, error = %err, "Skipping secret directory during auto-fill");
            return DirectoryMatches::default();
        }
    };
    let keys: Vec<MatchKey> = names.iter().map(|name| MatchKey::parse(name)).collect();
    let count = keys
        .iter()
        .filter(|k| k.matches_page(host, url) || k.is_exact(host))
        .count();

    let to_ref = |key: &MatchKey| SecretRef::new(dir, key.storage_path());
    match classify(host, url, &keys) {
        MatchOutcome::None => DirectoryMatches::default(),
        MatchOutcome::Direct(key) => DirectoryMatches {
            exact: vec![to_ref(key)],
            patterns: Vec::new(),
            count,
        },
        MatchOutcome::Ambiguous(matched) => DirectoryMatches {
            exact: Vec::new(),
            patterns: matched.into_iter().map(to_ref).collect(),
            count,
        },
    }
}

async fn fetch_all(client: &VaultClient, refs: &[SecretRef]) -> VaultResult<Vec<MatchCandidate>> {
    let results = join_all(
        refs.iter()
            .map(|secret| fetch_candidates(client, &secret.store_path, &secret.name)),
    )
    .await;
    let mut candidates = Vec::new();
    for result in results {
        candidates.extend(result?);
    }
    Ok(candidates)
}

/// Work out what to do for a page at `url` given the active directories.
///
/// Keys naming the host exactly win over pattern matches. A single
/// credential set under an exact key is filled directly; anything else that
/// produced candidates is offered for selection.
pub async fn plan_auto_fill(
    client: &VaultClient,
    dirs: &[String],
    url: &str,
) -> VaultResult<AutoFillPlan> {
    let (host, page_url) = match search_target(url) {
        SearchTarget::Host { host, url } => (host, url),
        SearchTarget::Manual(_) => {
            debug!("Page URL has no host, nothing to auto-fill");
            return Ok(AutoFillPlan::nothing(None));
        }
    };

    let per_dir = join_all(
        dirs.iter()
            .map(|dir| match_directory(client, dir, &host, &page_url)),
    )
    .await;

    let mut exact = Vec::new();
    let mut patterns = Vec::new();
    let mut match_count = 0;
    for matches in per_dir {
        exact.extend(matches.exact);
        patterns.extend(matches.patterns);
        match_count += matches.count;
    }

    let decision = if !exact.is_empty() {
        let mut candidates = fetch_all(client, &exact).await?;
        match candidates.len() {
            0 => AutoFillDecision::Nothing,
            1 => AutoFillDecision::Fill(candidates.remove(0)),
            _ => AutoFillDecision::Choose(candidates),
        }
    } else if !patterns.is_empty() {
        let candidates = fetch_all(client, &patterns).await?;
        if candidates.is_empty() {
            AutoFillDecision::Nothing
        } else {
            AutoFillDecision::Choose(candidates)
        }
    } else {
        AutoFillDecision::Nothing
    };

    info!(
        host = %host,
        match_count,
        exact = exact.len(),
        patterns = patterns.len(),
        "Planned auto-fill"
    );

    Ok(AutoFillPlan {
        host: Some(host),
        match_count,
        decision,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vault_kv_client::testing::{StubResponse, StubServer};
    use vault_kv_client::StorePath;

    fn entry(data: serde_json::Value) -> StubResponse {
        StubResponse::json(200, json!({"data": {"data": data, "metadata": {"version": 1}}}))
    }

    fn listing(keys: &[&str]) -> StubResponse {
        StubResponse::json(200, json!({"data": {"keys": keys}}))
    }

    #[tokio::test]
    async fn exact_key_is_filled_directly() {
        let server = StubServer::start(vec![
            (
                "LIST",
                "/v1/secret/metadata/vaultPass/personal/",
                listing(&["www.example.com", "example", "other.org"]),
            ),
            (
                "GET",
                "/v1/secret/data/vaultPass/personal/www.example.com",
                entry(json!({"username": "alice", "password": "pw"})),
            ),
        ])
        .await;
        let client = server.client(StorePath::default()).with_token("s.t");

        let plan = plan_auto_fill(&client, &["personal/".to_string()], "https://example.com/login")
            .await
            .unwrap();

        assert_eq!(plan.host.as_deref(), Some("example.com"));
        assert_eq!(plan.match_count, 2);
        assert_eq!(plan.badge_text(), Some("*"));
        match plan.decision {
            AutoFillDecision::Fill(candidate) => {
                assert_eq!(candidate.credentials.username, "alice");
                assert_eq!(candidate.secret.name, "www.example.com");
            }
            other => panic!("expected fill, got {:?}", other),
        }
        // The pattern-only key is never read when an exact key exists.
        assert!(!server
            .requests()
            .iter()
            .any(|r| r.path.ends_with("/personal/example")));
    }

    #[tokio::test]
    async fn pattern_matches_are_offered_for_selection() {
        let server = StubServer::start(vec![
            (
                "LIST",
                "/v1/secret/metadata/vaultPass/personal/",
                listing(&["example", "login"]),
            ),
            (
                "GET",
                "/v1/secret/data/vaultPass/personal/example",
                entry(json!({"username": "alice", "password": "pw1"})),
            ),
            (
                "GET",
                "/v1/secret/data/vaultPass/personal/login",
                entry(json!({"username": "bob", "password": "pw2"})),
            ),
        ])
        .await;
        let client = server.client(StorePath::default()).with_token("s.t");

        let plan = plan_auto_fill(&client, &["personal/".to_string()], "https://login.example.com/")
            .await
            .unwrap();

        assert_eq!(plan.match_count, 2);
        match plan.decision {
            AutoFillDecision::Choose(candidates) => {
                let users: Vec<_> = candidates
                    .iter()
                    .map(|c| c.credentials.username.as_str())
                    .collect();
                assert_eq!(users, vec!["alice", "bob"]);
            }
            other => panic!("expected choice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreadable_directory_and_no_match_do_nothing() {
        let server = StubServer::start(vec![
            (
                "LIST",
                "/v1/secret/metadata/vaultPass/team/",
                StubResponse::json(403, json!({"errors": ["permission denied"]})),
            ),
            (
                "LIST",
                "/v1/secret/metadata/vaultPass/personal/",
                listing(&["other.org"]),
            ),
        ])
        .await;
        let client = server.client(StorePath::default()).with_token("s.t");

        let plan = plan_auto_fill(
            &client,
            &["team/".to_string(), "personal/".to_string()],
            "https://example.com",
        )
        .await
        .unwrap();

        assert_eq!(plan.match_count, 0);
        assert_eq!(plan.badge_text(), None);
        assert_eq!(plan.decision, AutoFillDecision::Nothing);
    }

    #[tokio::test]
    async fn url_without_host_is_ignored() {
        let server = StubServer::start(vec![]).await;
        let client = server.client(StorePath::default()).with_token("s.t");

        let plan = plan_auto_fill(&client, &["personal/".to_string()], "about:blank")
            .await
            .unwrap();

        assert!(plan.host.is_none());
        assert_eq!(plan.decision, AutoFillDecision::Nothing);
        assert!(server.requests().is_empty());
    }
}
