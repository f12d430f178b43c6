//! Validation errors for keys and entry names.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("URL pattern is empty")]
    EmptyPattern,

    #[error("URL pattern cannot start with http:// or https://, use a regex such as ^https://example\\.com.* instead")]
    UrlScheme,

    #[error("Invalid URL regex pattern: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("Entry name must not contain '/'")]
    SlashInName,

    #[error("Entry name is empty")]
    EmptyName,
}

pub type MatcherResult<T> = Result<T, MatcherError>;
