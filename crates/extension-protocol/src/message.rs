//! Message definitions.

use crate::{ProtocolError, ProtocolResult};
use autofill::{DomMutation, PageSnapshot};
use credential_matcher::{CredentialSet, SecretRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Browser idle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyLevel {
    Info,
    Success,
    Error,
}

/// Badge background colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    /// `#1c98ed`
    Normal,
    /// `#FF0000`
    Error,
}

impl BadgeColor {
    pub fn hex(self) -> &'static str {
        match self {
            BadgeColor::Normal => "#1c98ed",
            BadgeColor::Error => "#FF0000",
        }
    }
}

/// One selectable credential set, with the entry it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    #[serde(flatten)]
    pub secret: SecretRef,
    #[serde(flatten)]
    pub credentials: CredentialSet,
}

/// Every message that crosses the extension boundary.
///
/// Serialized with a `type` discriminator. [`ExtensionMessage::from_value`]
/// also accepts the `message` discriminator used by content-script
/// listeners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtensionMessage {
    /// Credentials for the content script to put into the page.
    FillCreds {
        username: String,
        password: String,
        #[serde(default, rename = "isUserTriggered")]
        is_user_triggered: bool,
        /// Precomputed mutations when the request carried a page snapshot.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        mutations: Vec<DomMutation>,
        /// Page to fill on the host. The reply carries `mutations` instead.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page: Option<PageSnapshot>,
    },

    CopyToClipboard { string: String },

    /// Without a token: ask the content script to look for one.
    /// With a token (or a page snapshot to scan): report it.
    FetchToken {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        policies: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page: Option<PageSnapshot>,
    },

    TokenMissing {
        #[serde(default)]
        address: Option<String>,
    },

    /// Sent by the content script on page load.
    AutoFillSecrets {
        url: String,
        #[serde(default)]
        page: Option<PageSnapshot>,
    },

    /// Re-arm the token check timer with the default interval.
    AutoRenewToken,

    /// Begin grabbing a token from the server's web UI open at `address`.
    StartWebLoginFlow {
        #[serde(default)]
        address: Option<String>,
    },

    /// Popup search: a page URL or free text.
    QuerySecrets { query: String },

    IdleState { state: IdleState },

    /// Candidates for the user to pick from.
    ChooseMatch { matches: Vec<MatchCandidate> },

    SetBadge {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<BadgeColor>,
    },

    Notify { level: NotifyLevel, message: String },
}

impl ExtensionMessage {
    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtensionMessage::FillCreds { .. } => "fill_creds",
            ExtensionMessage::CopyToClipboard { .. } => "copy_to_clipboard",
            ExtensionMessage::FetchToken { .. } => "fetch_token",
            ExtensionMessage::TokenMissing { .. } => "token_missing",
            ExtensionMessage::AutoFillSecrets { .. } => "auto_fill_secrets",
            ExtensionMessage::AutoRenewToken => "auto_renew_token",
            ExtensionMessage::StartWebLoginFlow { .. } => "start_web_login_flow",
            ExtensionMessage::QuerySecrets { .. } => "query_secrets",
            ExtensionMessage::IdleState { .. } => "idle_state",
            ExtensionMessage::ChooseMatch { .. } => "choose_match",
            ExtensionMessage::SetBadge { .. } => "set_badge",
            ExtensionMessage::Notify { .. } => "notify",
        }
    }

    pub fn notify(level: NotifyLevel, message: impl Into<String>) -> Self {
        ExtensionMessage::Notify {
            level,
            message: message.into(),
        }
    }

    /// Decode from JSON, accepting either `type` or `message` as discriminator.
    ///
    /// `type` wins when both are present, since `notify` carries its text in
    /// a `message` field.
    pub fn from_value(mut value: Value) -> ProtocolResult<Self> {
        let Value::Object(object) = &mut value else {
            return Err(ProtocolError::Protocol(
                "message must be a JSON object".to_string(),
            ));
        };
        if !object.contains_key("type") {
            match object.remove("message") {
                Some(Value::String(kind)) => {
                    object.insert("type".to_string(), Value::String(kind));
                }
                _ => {
                    return Err(ProtocolError::Protocol(
                        "message has neither a `type` nor a `message` discriminator".to_string(),
                    ))
                }
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_slice(bytes: &[u8]) -> ProtocolResult<Self> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }
}
