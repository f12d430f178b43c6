//! CLI command implementations.

mod add;
mod auth;
mod query;
mod secrets;

pub use add::{add, add_pattern_key};
pub use auth::{login, logout, renew, status};
pub use query::query;
pub use secrets::{secrets_disable, secrets_enable, secrets_list};
