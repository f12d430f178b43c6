//! Keeping the secrets-server token alive.
//!
//! A background task looks the token up on a timer and renews it once the
//! remaining TTL drops under [`RENEW_THRESHOLD_SECS`]. The next check is
//! scheduled from the observed TTL; failures fall back to the default
//! interval and flip the badge to [`BadgeIndicator::Error`].

mod api;
mod renewer;
mod schedule;

pub use api::TokenApi;
pub use renewer::{
    check_token, start_token_renewer, BadgeIndicator, CheckOutcome, RenewCommand, RenewerStatus,
    TokenRenewerHandle,
};
pub use schedule::{
    next_check_interval, should_renew, DEFAULT_CHECK_INTERVAL, LONG_TTL_SECS, MAX_CHECK_INTERVAL,
    RENEW_INCREMENT, RENEW_THRESHOLD_SECS,
};
