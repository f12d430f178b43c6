//! Operations behind the CLI commands and the native-messaging host.

pub mod add;
pub mod autofill;
pub mod query;
pub mod secrets;
pub mod session;

use credential_matcher::{extract_credential_sets, SecretRef};
use extension_protocol::MatchCandidate;
use vault_kv_client::{VaultClient, VaultResult};

/// Read entry `name` in `dir` and pair each credential set with its reference.
///
/// A missing entry yields no candidates.
pub(crate) async fn fetch_candidates(
    client: &VaultClient,
    dir: &str,
    name: &str,
) -> VaultResult<Vec<MatchCandidate>> {
    let Some(entry) = client.read(dir, name).await? else {
        return Ok(Vec::new());
    };
    let secret = SecretRef::new(dir, name);
    Ok(extract_credential_sets(&entry.data)
        .into_iter()
        .map(|credentials| MatchCandidate {
            secret: secret.clone(),
            credentials,
        })
        .collect())
}
