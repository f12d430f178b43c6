//! Adding credentials and keys.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use crate::service::add::{add_credentials, add_key};
use anyhow::Result;

/// Add a login to the entry for `url` in `dir`.
pub async fn add(
    context: &AppContext,
    dir: &str,
    url: &str,
    login: &str,
    format: &OutputFormat,
) -> Result<()> {
    let settings = context.settings()?;
    let client = context.client(&settings)?;
    let password = rpassword::prompt_password("Password: ")?;

    match add_credentials(&client, dir, url, login, &password).await {
        Ok(added) => output::print_success(
            &format!("Added entry {} to {}", added.field, added.path),
            format,
        ),
        Err(e) => output::print_error(&e.to_string(), format),
    }
    Ok(())
}

/// Store a new key whose name is a URL regex.
pub async fn add_pattern_key(
    context: &AppContext,
    dir: &str,
    pattern: &str,
    username: &str,
    title: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let settings = context.settings()?;
    let client = context.client(&settings)?;
    let password = rpassword::prompt_password("Password: ")?;

    match add_key(&client, dir, pattern, username, &password, title).await {
        Ok(name) => {
            tracing::debug!(key = %name, "Key stored");
            output::print_success("Key saved successfully to Vault!", format);
        }
        Err(e) => output::print_error(&format!("Error saving key: {}", e), format),
    }
    Ok(())
}
