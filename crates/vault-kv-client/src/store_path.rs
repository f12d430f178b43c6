//! KV store path handling.

/// Store path used when none is configured.
pub const DEFAULT_STORE_PATH: &str = "secret/vaultPass";

/// Which half of the KV v2 API a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// `metadata`: listing keys
    Metadata,
    /// `data`: reading and writing entries
    Data,
}

impl Segment {
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Metadata => "metadata",
            Segment::Data => "data",
        }
    }
}

/// A store path split into its mount root and sub path.
///
/// `secret/vaultPass` becomes root `secret`, sub path `/vaultPass`;
/// `kv` becomes root `kv` with an empty sub path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePath {
    root: String,
    sub_path: String,
}

impl StorePath {
    /// Parse a store path; empty input selects [`DEFAULT_STORE_PATH`].
    pub fn parse(raw: &str) -> Self {
        let path = if raw.is_empty() { DEFAULT_STORE_PATH } else { raw };
        let (root, rest) = path.split_once('/').unwrap_or((path, ""));
        Self {
            root: root.to_string(),
            sub_path: if rest.is_empty() {
                String::new()
            } else {
                format!("/{}", rest)
            },
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Sub path with its leading `/`, or empty.
    pub fn sub_path(&self) -> &str {
        &self.sub_path
    }

    /// API path (without `/v1/`) for `path` under this store.
    ///
    /// `path` is normalised to exactly one leading slash.
    pub fn api_path(&self, segment: Segment, path: &str) -> String {
        let trimmed = path.trim_start_matches('/');
        let suffix = if path.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        };
        format!("{}/{}{}{}", self.root, segment.as_str(), self.sub_path, suffix)
    }
}

impl Default for StorePath {
    fn default() -> Self {
        Self::parse(DEFAULT_STORE_PATH)
    }
}

/// Percent-encode each `/`-separated component of an entry name.
///
/// Entry names are regex patterns and may contain `\`, `^` or `%`; the
/// server decodes the path once, so one encoding round here lands the
/// exact name on the server.
pub fn encode_entry_name(name: &str) -> String {
    name.split('/')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
