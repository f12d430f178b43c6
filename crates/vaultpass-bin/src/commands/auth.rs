//! Authentication commands.

use crate::context::AppContext;
use crate::output::{self, OutputFormat};
use crate::service::session::{self, LoginTarget};
use anyhow::Result;
use std::io::{self, Write};
use token_lifecycle::{check_token, CheckOutcome};

/// Login with username and password.
pub async fn login(
    context: &AppContext,
    target: LoginTarget,
    username: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let settings = context.settings()?;

    let username = match username.or(settings.username) {
        Some(username) if !username.is_empty() => username,
        _ => {
            print!("Username: ");
            io::stdout().flush()?;
            let mut username = String::new();
            io::stdin().read_line(&mut username)?;
            username.trim().to_string()
        }
    };
    if username.is_empty() {
        output::print_error("Username is required", format);
        return Ok(());
    }

    // Prompt for password (hidden)
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }

    match session::login(context, &target, &username, &password).await {
        Ok(auth) => {
            output::print_success(&format!("Logged in as {}", username), format);
            if !auth.policies.is_empty() {
                output::print_info(
                    &format!("Attached policies: {}", auth.policies.join(", ")),
                    format,
                );
            }
        }
        Err(e) => output::print_error(&format!("Login failed: {}", e), format),
    }
    Ok(())
}

/// Forget the stored token.
pub fn logout(context: &AppContext, format: &OutputFormat) -> Result<()> {
    if session::logout(context)? {
        output::print_success("logged out", format);
    } else {
        output::print_info("Not logged in", format);
    }
    Ok(())
}

/// Show settings and token state.
pub async fn status(context: &AppContext, format: &OutputFormat) -> Result<()> {
    let report = session::status(context).await?;
    output::print(&report, format);
    Ok(())
}

/// Check the token now and renew it when due (or always with `force`).
pub async fn renew(context: &AppContext, force: bool, format: &OutputFormat) -> Result<()> {
    let settings = context.settings()?;
    let client = context.client(&settings)?;

    match check_token(&client, force).await {
        CheckOutcome::NoToken => output::print_info("Not logged in", format),
        CheckOutcome::Checked {
            ttl,
            renewed_lease: Some(lease),
        } => output::print_success(
            &format!("Token renewed (ttl was {}s, new lease {}s)", ttl, lease),
            format,
        ),
        CheckOutcome::Checked {
            ttl,
            renewed_lease: None,
        } => output::print_info(
            &format!("Token will expire in {} seconds, no renewal needed", ttl),
            format,
        ),
        CheckOutcome::NotRenewable { ttl: 0 } => {
            output::print_info("Token does not expire and cannot be renewed", format)
        }
        CheckOutcome::NotRenewable { ttl } => output::print_info(
            &format!("Token will expire in {} seconds and cannot be renewed", ttl),
            format,
        ),
        CheckOutcome::Failed(err) => {
            output::print_error(&format!("Token check failed: {}", err), format)
        }
    }
    Ok(())
}
