//! Secret directory commands.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use crate::service::secrets::{disable_directory, enable_directory, refresh_directories};
use anyhow::Result;

/// List directories under the store root, pruning vanished active ones.
pub async fn secrets_list(context: &AppContext, format: &OutputFormat) -> Result<()> {
    let mut settings = context.settings()?;
    let client = context.client(&settings)?;

    match refresh_directories(&client, &mut settings).await {
        Ok(listing) => {
            if !listing.pruned.is_empty() {
                context.save_settings(&settings)?;
            }
            output::print(&listing, format);
        }
        Err(e) => output::print_error(
            &format!("Fetching list of secret directories failed: {}", e),
            format,
        ),
    }
    Ok(())
}

/// Activate a directory.
pub async fn secrets_enable(context: &AppContext, dir: &str, format: &OutputFormat) -> Result<()> {
    let mut settings = context.settings()?;
    let client = context.client(&settings)?;

    match enable_directory(&client, &mut settings, dir).await {
        Ok((dir, true)) => {
            context.save_settings(&settings)?;
            output::print_success(&format!("Enabled {}", dir), format);
        }
        Ok((dir, false)) => output::print_info(&format!("{} is already active", dir), format),
        Err(e) => output::print_error(&format!("ERROR accessing this field: {}", e), format),
    }
    Ok(())
}

/// Deactivate a directory.
pub fn secrets_disable(context: &AppContext, dir: &str, format: &OutputFormat) -> Result<()> {
    let mut settings = context.settings()?;
    if disable_directory(&mut settings, dir) > 0 {
        context.save_settings(&settings)?;
        output::print_success(&format!("Disabled {}", dir), format);
    } else {
        output::print_info(&format!("{} was not active", dir), format);
    }
    Ok(())
}
