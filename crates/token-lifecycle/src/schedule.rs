//! Check interval and renewal thresholds.

use std::time::Duration;

/// Interval used initially, after a re-arm, and after a failed check.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(45);

/// Ceiling applied once the TTL exceeds [`LONG_TTL_SECS`].
pub const MAX_CHECK_INTERVAL: Duration = Duration::from_secs(1800);

pub const LONG_TTL_SECS: u64 = 3600;

/// Tokens with this many seconds or fewer left are renewed.
pub const RENEW_THRESHOLD_SECS: u64 = 600;

/// Lease extension requested on renewal.
pub const RENEW_INCREMENT: &str = "24h";

/// Delay before the next check for a token with `ttl_secs` left.
///
/// Half the TTL, capped at [`MAX_CHECK_INTERVAL`] for long-lived tokens and
/// never below one second.
pub fn next_check_interval(ttl_secs: u64) -> Duration {
    if ttl_secs > LONG_TTL_SECS {
        MAX_CHECK_INTERVAL
    } else {
        Duration::from_secs((ttl_secs / 2).max(1))
    }
}

pub fn should_renew(ttl_secs: u64, force: bool) -> bool {
    force || ttl_secs <= RENEW_THRESHOLD_SECS
}
