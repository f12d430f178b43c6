//! Credential search.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use crate::service::query::query_secrets;
use anyhow::Result;

/// Search the active directories for a URL or free text.
pub async fn query(context: &AppContext, input: &str, format: &OutputFormat) -> Result<()> {
    let settings = context.settings()?;
    if settings.secrets.is_empty() {
        output::print_info(
            "No secret directories are active. Enable one with 'vaultpass secrets enable <dir>'",
            format,
        );
        return Ok(());
    }
    let client = context.client(&settings)?;

    match query_secrets(&client, &settings.secrets, input).await {
        Ok(result) => output::print(&result.into_report(), format),
        Err(e) => output::print_error(&e.to_string(), format),
    }
    Ok(())
}
