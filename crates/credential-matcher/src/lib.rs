//! Matching visited pages against stored secret keys.
//!
//! A stored key is both a path segment on the secrets server and a regular
//! expression tested against hostnames. [`MatchKey`] keeps the two roles
//! apart; [`match_keys`] and [`classify`] decide which keys apply to a page;
//! [`extract_credential_sets`] turns an entry's fields into username and
//! password pairs.

mod credentials;
mod error;
mod hostname;
mod key;
mod matcher;
mod secret_ref;

pub use credentials::{extract_credential_sets, CredentialSet};
pub use error::{MatcherError, MatcherResult};
pub use hostname::{clear_hostname, search_target, SearchTarget};
pub use key::{storage_name_for_pattern, validate_entry_name, validate_key_pattern, MatchKey};
pub use matcher::{classify, find_exact, match_keys, match_page, match_search, MatchOutcome};
pub use secret_ref::SecretRef;
