//! VaultPass - website credentials from a Vault KV store.
//!
//! One binary: a CLI for the options, popup and add screens, and the
//! native-messaging host the browser extension talks to.

mod commands;
mod context;
mod host;
mod output;
mod service;

use clap::{Parser, Subcommand};
use context::AppContext;
use service::session::LoginTarget;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use vaultpass_config::{init_logging, init_logging_for_service, Config, Paths};

/// VaultPass - fill website logins from a Vault KV store.
#[derive(Parser)]
#[command(name = "vaultpass")]
#[command(about = "VaultPass CLI and browser native-messaging host")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "VAULTPASS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Base directory for settings, token and logs (default ~/.vaultpass)
    #[arg(long, global = true, env = "VAULTPASS_HOME")]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with username and password
    Login {
        /// Vault server address, e.g. https://vault.example.com
        #[arg(short, long)]
        address: Option<String>,
        /// Username (prompted when not stored)
        #[arg(short, long)]
        username: Option<String>,
        /// Auth mount (default userpass)
        #[arg(long)]
        auth_method: Option<String>,
        /// KV store path (default secret/vaultPass)
        #[arg(long)]
        store_path: Option<String>,
    },

    /// Logout and clear the stored token
    Logout,

    /// Show settings and token status
    Status,

    /// Check the token and renew it when due
    Renew {
        /// Renew regardless of the remaining TTL
        #[arg(long)]
        force: bool,
    },

    /// Manage active secret directories
    Secrets {
        #[command(subcommand)]
        command: SecretCommands,
    },

    /// Search credentials for a URL or free text
    Query {
        /// Page URL or search term
        input: String,
    },

    /// Add a login to the entry named after a host
    Add {
        /// Secret directory, e.g. personal/
        #[arg(short, long)]
        dir: String,
        /// Host name used as the entry name (no slashes)
        #[arg(long)]
        url: String,
        /// Login name
        #[arg(short, long)]
        login: String,
    },

    /// Store a key whose name is a URL regex
    AddKey {
        /// Secret directory, e.g. personal/
        #[arg(short, long)]
        dir: String,
        /// URL regex, e.g. ^login\.example\.com$
        #[arg(short, long)]
        pattern: String,
        /// Username
        #[arg(short, long)]
        username: String,
        /// Display title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Run as the browser's native-messaging host
    Host,
}

#[derive(Subcommand)]
enum SecretCommands {
    /// List directories under the store root
    List,
    /// Activate a directory
    Enable {
        /// Directory name
        dir: String,
    },
    /// Deactivate a directory
    Disable {
        /// Directory name
        dir: String,
    },
}

/// Browsers start native hosts with the caller's origin (Chromium) or the
/// manifest path and extension id (Firefox) instead of a subcommand.
fn launched_by_browser(args: &[String]) -> bool {
    args.get(1).is_some_and(|arg| {
        arg.starts_with("chrome-extension://") || arg.ends_with(".json")
    })
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let cli = if launched_by_browser(&args) {
        Cli {
            command: Commands::Host,
            format: output::OutputFormat::Text,
            log_level: None,
            base_dir: None,
        }
    } else {
        Cli::parse()
    };

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let paths = match cli.base_dir {
        Some(base_dir) => Paths::with_base_dir(base_dir),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;
    let level = cli.log_level.unwrap_or(config.log_level);

    if matches!(cli.command, Commands::Host) {
        init_logging_for_service("vaultpass-host", &level, &paths, config.log_to_stderr);
    } else {
        init_logging(&level, &paths, config.log_to_stderr);
    }

    let context = AppContext::open(paths)?;
    let format = cli.format;
    debug!(base_dir = %context.paths().base_dir().display(), "Starting");

    match cli.command {
        Commands::Login {
            address,
            username,
            auth_method,
            store_path,
        } => {
            let target = LoginTarget {
                address,
                auth_method,
                store_path,
            };
            commands::login(&context, target, username, &format).await
        }
        Commands::Logout => commands::logout(&context, &format),
        Commands::Status => commands::status(&context, &format).await,
        Commands::Renew { force } => commands::renew(&context, force, &format).await,
        Commands::Secrets { command } => match command {
            SecretCommands::List => commands::secrets_list(&context, &format).await,
            SecretCommands::Enable { dir } => commands::secrets_enable(&context, &dir, &format).await,
            SecretCommands::Disable { dir } => commands::secrets_disable(&context, &dir, &format),
        },
        Commands::Query { input } => commands::query(&context, &input, &format).await,
        Commands::Add { dir, url, login } => {
            commands::add(&context, &dir, &url, &login, &format).await
        }
        Commands::AddKey {
            dir,
            pattern,
            username,
            title,
        } => {
            commands::add_pattern_key(&context, &dir, &pattern, &username, title.as_deref(), &format)
                .await
        }
        Commands::Host => host::run(Arc::new(context)).await,
    }
}
