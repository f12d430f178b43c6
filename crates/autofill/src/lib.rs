//! Locating login fields in a page and filling them.
//!
//! The page is reached through the [`Page`] trait. [`PageSnapshot`] is the
//! serializable model a content script sends to the host; it records every
//! mutation so the script can replay them against the live document.

mod error;
mod fill;
mod page;
mod selector;
mod snapshot;
mod token_scan;

pub use error::{AutofillError, AutofillResult};
pub use fill::{fill_page, FillOutcome, FillRequest};
pub use page::{DomEvent, Page, Scope};
pub use selector::{FieldSelector, PASSWORD_SELECTOR, TEXT_FALLBACK_SELECTOR, USERNAME_SELECTORS};
pub use snapshot::{DomMutation, ElementSnapshot, PageSnapshot};
pub use token_scan::{find_token_record, TokenRecord};
