//! Replies to each extension message.

use crate::context::AppContext;
use crate::service::autofill::{plan_auto_fill, AutoFillDecision};
use crate::service::query::query_secrets;
use crate::service::session::store_token;
use anyhow::Result;
use autofill::{fill_page, find_token_record, FillRequest, PageSnapshot};
use extension_protocol::{BadgeColor, ExtensionMessage, IdleState, NotifyLevel};
use std::sync::Arc;
use token_lifecycle::{RenewCommand, TokenRenewerHandle};
use tracing::{debug, info, warn};
use vault_kv_client::VaultError;

/// Handles one message at a time against shared context and the renewer.
pub struct MessageHandler {
    context: Arc<AppContext>,
    renewer: TokenRenewerHandle,
}

impl MessageHandler {
    pub fn new(context: Arc<AppContext>, renewer: TokenRenewerHandle) -> Self {
        Self { context, renewer }
    }

    pub fn renewer(&self) -> &TokenRenewerHandle {
        &self.renewer
    }

    pub async fn shutdown(self) {
        self.renewer.shutdown().await;
    }

    /// Messages to send back for `message`. Failures become a `notify`.
    pub async fn handle(&self, message: ExtensionMessage) -> Vec<ExtensionMessage> {
        let kind = message.kind();
        match self.dispatch(message).await {
            Ok(replies) => replies,
            Err(err) => {
                warn!(kind, error = %err, "Failed to handle message");
                vec![ExtensionMessage::notify(NotifyLevel::Error, err.to_string())]
            }
        }
    }

    async fn dispatch(&self, message: ExtensionMessage) -> Result<Vec<ExtensionMessage>> {
        match message {
            ExtensionMessage::FillCreds {
                username,
                password,
                is_user_triggered,
                page: Some(page),
                ..
            } => {
                let request = FillRequest {
                    username,
                    password,
                    is_user_triggered,
                };
                Ok(vec![fill_message(request, Some(page))?])
            }
            ExtensionMessage::FillCreds { .. } | ExtensionMessage::CopyToClipboard { .. } => {
                Ok(vec![message])
            }
            ExtensionMessage::FetchToken {
                token,
                policies,
                address,
                page,
            } => self.fetch_token(token, policies, address, page),
            ExtensionMessage::TokenMissing { address } => {
                info!(address = ?address, "No token found on page");
                Ok(vec![ExtensionMessage::notify(
                    NotifyLevel::Error,
                    "No Vault token found on this page. Log in to the Vault web UI and try again.",
                )])
            }
            ExtensionMessage::AutoFillSecrets { url, page } => self.auto_fill(&url, page).await,
            ExtensionMessage::AutoRenewToken => {
                self.renewer.send(RenewCommand::Rearm);
                Ok(Vec::new())
            }
            ExtensionMessage::StartWebLoginFlow { address } => {
                if let Some(address) = address.as_deref().filter(|a| !a.is_empty()) {
                    let mut settings = self.context.settings()?;
                    settings.vault_address = Some(address.to_string());
                    self.context.save_settings(&settings)?;
                }
                Ok(vec![ExtensionMessage::FetchToken {
                    token: None,
                    policies: Vec::new(),
                    address,
                    page: None,
                }])
            }
            ExtensionMessage::QuerySecrets { query } => self.query(&query).await,
            ExtensionMessage::IdleState { state } => {
                match state {
                    IdleState::Active => self.renewer.check_now(false),
                    IdleState::Locked => self.renewer.check_now(true),
                    IdleState::Idle => debug!("Browser idle"),
                }
                Ok(Vec::new())
            }
            ExtensionMessage::ChooseMatch { .. }
            | ExtensionMessage::SetBadge { .. }
            | ExtensionMessage::Notify { .. } => {
                anyhow::bail!("Unexpected {} message from the extension", message.kind())
            }
        }
    }

    fn fetch_token(
        &self,
        token: Option<String>,
        policies: Vec<String>,
        address: Option<String>,
        page: Option<PageSnapshot>,
    ) -> Result<Vec<ExtensionMessage>> {
        let (token, policies) = match (token, page) {
            (Some(token), _) => (token, policies),
            (None, Some(page)) => match find_token_record(&page.local_storage) {
                Some(record) => (record.token, record.policies),
                None => return Ok(vec![ExtensionMessage::TokenMissing { address }]),
            },
            (None, None) => return Ok(vec![ExtensionMessage::TokenMissing { address }]),
        };

        store_token(&self.context, &token, &policies, address.as_deref())?;
        Ok(vec![ExtensionMessage::notify(
            NotifyLevel::Success,
            format!("Token stored. Attached policies: {}", policies.join(", ")),
        )])
    }

    async fn auto_fill(
        &self,
        url: &str,
        page: Option<PageSnapshot>,
    ) -> Result<Vec<ExtensionMessage>> {
        let settings = self.context.settings()?;
        let client = match self.context.client(&settings) {
            Ok(client) => client,
            Err(err @ (VaultError::MissingToken | VaultError::InvalidRequest(_))) => {
                debug!(error = %err, "Not logged in, skipping auto-fill");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let plan = plan_auto_fill(&client, &settings.secrets, url).await?;
        let mut replies = Vec::new();
        if let Some(text) = plan.badge_text() {
            replies.push(ExtensionMessage::SetBadge {
                text: text.to_string(),
                color: None,
            });
        }
        match plan.decision {
            AutoFillDecision::Nothing => {}
            AutoFillDecision::Fill(candidate) => {
                let request = FillRequest {
                    username: candidate.credentials.username,
                    password: candidate.credentials.password,
                    is_user_triggered: false,
                };
                replies.push(fill_message(request, page)?);
            }
            AutoFillDecision::Choose(matches) => {
                replies.push(ExtensionMessage::ChooseMatch { matches });
            }
        }
        Ok(replies)
    }

    async fn query(&self, query: &str) -> Result<Vec<ExtensionMessage>> {
        let settings = self.context.settings()?;
        let client = self.context.client(&settings)?;

        let context = match query_secrets(&client, &settings.secrets, query).await {
            Ok(context) => context,
            Err(err) => {
                return Ok(vec![
                    ExtensionMessage::SetBadge {
                        text: String::new(),
                        color: None,
                    },
                    ExtensionMessage::notify(NotifyLevel::Error, err.to_string()),
                ]);
            }
        };

        let mut replies = vec![ExtensionMessage::SetBadge {
            text: context.badge_text(),
            color: None,
        }];
        for warning in context.warnings() {
            replies.push(ExtensionMessage::notify(NotifyLevel::Error, warning.clone()));
        }
        match context.empty_message() {
            Some(message) => replies.push(ExtensionMessage::notify(NotifyLevel::Info, message)),
            None => replies.push(ExtensionMessage::ChooseMatch {
                matches: context.matches().to_vec(),
            }),
        }
        Ok(replies)
    }
}

/// `fill_creds` reply, with replayable mutations when a page snapshot came
/// along.
fn fill_message(request: FillRequest, page: Option<PageSnapshot>) -> Result<ExtensionMessage> {
    let mutations = match page {
        Some(mut page) => {
            page.validate()?;
            let outcome = fill_page(&mut page, &request);
            debug!(outcome = ?outcome, "Filled page snapshot");
            page.into_mutations()
        }
        None => Vec::new(),
    };
    Ok(ExtensionMessage::FillCreds {
        username: request.username,
        password: request.password,
        is_user_triggered: request.is_user_triggered,
        mutations,
        page: None,
    })
}

/// Badge update for a renewer state change.
pub fn badge_message(indicator: token_lifecycle::BadgeIndicator) -> ExtensionMessage {
    match indicator {
        token_lifecycle::BadgeIndicator::Ok => ExtensionMessage::SetBadge {
            text: String::new(),
            color: Some(BadgeColor::Normal),
        },
        token_lifecycle::BadgeIndicator::Error => ExtensionMessage::SetBadge {
            text: "!".to_string(),
            color: Some(BadgeColor::Error),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::context_for;
    use autofill::{DomMutation, ElementSnapshot};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;
    use token_lifecycle::start_token_renewer;
    use vault_kv_client::testing::{StubResponse, StubServer};

    fn handler_for(context: AppContext) -> MessageHandler {
        let context = Arc::new(context);
        let api = Arc::new(crate::context::StoredTokenApi::new(context.clone()));
        let renewer = start_token_renewer(api, Duration::from_secs(3600));
        MessageHandler::new(context, renewer)
    }

    fn login_page() -> PageSnapshot {
        PageSnapshot::new(vec![
            ElementSnapshot::form(),
            ElementSnapshot::input("text").with_attr("name", "user").in_form(0),
            ElementSnapshot::input("password").in_form(0),
        ])
    }

    #[tokio::test]
    async fn auto_fill_exact_hit_returns_badge_and_mutations() {
        let server = StubServer::start(vec![
            (
                "LIST",
                "/v1/secret/metadata/vaultPass/personal/",
                StubResponse::json(200, json!({"data": {"keys": ["example.com"]}})),
            ),
            (
                "GET",
                "/v1/secret/data/vaultPass/personal/example.com",
                StubResponse::json(
                    200,
                    json!({"data": {"data": {"username": "alice", "password": "pw"}, "metadata": {"version": 1}}}),
                ),
            ),
        ])
        .await;
        let dir = tempdir().unwrap();
        let context = context_for(&server, &dir);
        let mut settings = context.settings().unwrap();
        settings.activate("personal/");
        context.save_settings(&settings).unwrap();
        let handler = handler_for(context);

        let replies = handler
            .handle(ExtensionMessage::AutoFillSecrets {
                url: "https://www.example.com/login".into(),
                page: Some(login_page()),
            })
            .await;

        assert_eq!(replies.len(), 2);
        assert_eq!(
            replies[0],
            ExtensionMessage::SetBadge {
                text: "*".into(),
                color: None
            }
        );
        match &replies[1] {
            ExtensionMessage::FillCreds {
                username,
                is_user_triggered,
                mutations,
                ..
            } => {
                assert_eq!(username, "alice");
                assert!(!is_user_triggered);
                assert!(mutations.contains(&DomMutation::SetValue {
                    node: 2,
                    value: "pw".into()
                }));
                assert!(mutations.contains(&DomMutation::SetValue {
                    node: 1,
                    value: "alice".into()
                }));
            }
            other => panic!("expected fill_creds, got {:?}", other),
        }
        handler.shutdown().await;
    }

    #[tokio::test]
    async fn auto_fill_without_token_is_silent() {
        let server = StubServer::start(vec![]).await;
        let dir = tempdir().unwrap();
        let context = context_for(&server, &dir);
        context.tokens().clear().unwrap();
        let handler = handler_for(context);

        let replies = handler
            .handle(ExtensionMessage::AutoFillSecrets {
                url: "https://example.com".into(),
                page: None,
            })
            .await;
        assert!(replies.is_empty());
        assert!(server.requests().is_empty());
        handler.shutdown().await;
    }

    #[tokio::test]
    async fn query_without_matches_notifies() {
        let server = StubServer::start(vec![(
            "LIST",
            "/v1/secret/metadata/vaultPass/personal/",
            StubResponse::json(200, json!({"data": {"keys": ["other.org"]}})),
        )])
        .await;
        let dir = tempdir().unwrap();
        let context = context_for(&server, &dir);
        let mut settings = context.settings().unwrap();
        settings.activate("personal/");
        context.save_settings(&settings).unwrap();
        let handler = handler_for(context);

        let replies = handler
            .handle(ExtensionMessage::QuerySecrets {
                query: "github".into(),
            })
            .await;

        assert_eq!(
            replies,
            vec![
                ExtensionMessage::SetBadge {
                    text: String::new(),
                    color: None
                },
                ExtensionMessage::notify(NotifyLevel::Info, "No matching key found for the search"),
            ]
        );
        handler.shutdown().await;
    }

    #[tokio::test]
    async fn token_is_grabbed_from_page_storage() {
        let server = StubServer::start(vec![]).await;
        let dir = tempdir().unwrap();
        let context = context_for(&server, &dir);
        context.tokens().clear().unwrap();
        let context = Arc::new(context);
        let api = Arc::new(crate::context::StoredTokenApi::new(context.clone()));
        let handler = MessageHandler::new(
            context.clone(),
            start_token_renewer(api, Duration::from_secs(3600)),
        );

        let mut page = PageSnapshot::new(Vec::new());
        page.local_storage = vec![
            "not json".into(),
            json!({"token": "s.grabbed", "ttl": 100, "policies": ["default"]}).to_string(),
        ];
        let replies = handler
            .handle(ExtensionMessage::FetchToken {
                token: None,
                policies: Vec::new(),
                address: Some("https://vault.example.com".into()),
                page: Some(page),
            })
            .await;

        assert!(matches!(
            replies.as_slice(),
            [ExtensionMessage::Notify {
                level: NotifyLevel::Success,
                ..
            }]
        ));
        assert_eq!(
            context.tokens().get_token().unwrap().as_deref(),
            Some("s.grabbed")
        );

        let replies = handler
            .handle(ExtensionMessage::FetchToken {
                token: None,
                policies: Vec::new(),
                address: None,
                page: Some(PageSnapshot::new(Vec::new())),
            })
            .await;
        assert_eq!(replies, vec![ExtensionMessage::TokenMissing { address: None }]);
        handler.shutdown().await;
    }

    fn fill_request(is_user_triggered: bool, page: Option<PageSnapshot>) -> ExtensionMessage {
        ExtensionMessage::FillCreds {
            username: "alice".into(),
            password: "pw".into(),
            is_user_triggered,
            mutations: Vec::new(),
            page,
        }
    }

    fn filled_values(reply: &ExtensionMessage) -> Vec<(usize, String)> {
        match reply {
            ExtensionMessage::FillCreds {
                mutations, page, ..
            } => {
                assert!(page.is_none());
                mutations
                    .iter()
                    .filter_map(|m| match m {
                        DomMutation::SetValue { node, value } => Some((*node, value.clone())),
                        _ => None,
                    })
                    .collect()
            }
            other => panic!("expected fill_creds, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn user_triggered_fill_reaches_page_wide_text_input() {
        let server = StubServer::start(vec![]).await;
        let dir = tempdir().unwrap();
        let handler = handler_for(context_for(&server, &dir));
        let page = PageSnapshot::new(vec![
            ElementSnapshot::input("text"),
            ElementSnapshot::input("password"),
        ]);

        let replies = handler.handle(fill_request(true, Some(page.clone()))).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(
            filled_values(&replies[0]),
            vec![(1, "pw".to_string()), (0, "alice".to_string())]
        );

        let replies = handler.handle(fill_request(false, Some(page))).await;
        assert_eq!(filled_values(&replies[0]), vec![(1, "pw".to_string())]);

        let plain = fill_request(true, None);
        assert_eq!(handler.handle(plain.clone()).await, vec![plain]);
        assert!(server.requests().is_empty());
        handler.shutdown().await;
    }

    #[tokio::test]
    async fn relays_and_login_flow() {
        let server = StubServer::start(vec![]).await;
        let dir = tempdir().unwrap();
        let handler = handler_for(context_for(&server, &dir));

        let copy = ExtensionMessage::CopyToClipboard {
            string: "pw".into(),
        };
        assert_eq!(handler.handle(copy.clone()).await, vec![copy]);

        let replies = handler
            .handle(ExtensionMessage::StartWebLoginFlow { address: None })
            .await;
        assert_eq!(
            replies,
            vec![ExtensionMessage::FetchToken {
                token: None,
                policies: Vec::new(),
                address: None,
                page: None,
            }]
        );

        let replies = handler
            .handle(ExtensionMessage::notify(NotifyLevel::Info, "hi"))
            .await;
        assert!(matches!(
            replies.as_slice(),
            [ExtensionMessage::Notify {
                level: NotifyLevel::Error,
                ..
            }]
        ));
        handler.shutdown().await;
    }

    #[test]
    fn badge_messages_follow_indicator() {
        assert_eq!(
            badge_message(token_lifecycle::BadgeIndicator::Error),
            ExtensionMessage::SetBadge {
                text: "!".into(),
                color: Some(BadgeColor::Error)
            }
        );
    }
}
