//! Messages exchanged with the browser extension.
//!
//! [`ExtensionMessage`] covers every message the content script, popup and
//! background relay send or receive. [`framing`] implements the browser
//! native-messaging transport: a 4-byte native-endian length followed by
//! UTF-8 JSON.

mod error;
pub mod framing;
mod message;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{
    read_message, write_message, MAX_INCOMING_MESSAGE_BYTES, MAX_OUTGOING_MESSAGE_BYTES,
};
pub use message::{BadgeColor, ExtensionMessage, IdleState, MatchCandidate, NotifyLevel};
