//! Background renewal task.

use crate::schedule::{
    next_check_interval, should_renew, DEFAULT_CHECK_INTERVAL, MAX_CHECK_INTERVAL, RENEW_INCREMENT,
};
use crate::TokenApi;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use vault_kv_client::VaultError;

/// Extension badge state driven by renewal results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeIndicator {
    Ok,
    Error,
}

/// Requests accepted by a running renewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewCommand {
    /// Restart the timer with the default interval.
    Rearm,
    /// Check now; `force` renews regardless of the remaining TTL.
    Check { force: bool },
}

/// Result of one lookup (and possible renewal).
#[derive(Debug)]
pub enum CheckOutcome {
    /// Nothing stored to renew.
    NoToken,
    Checked {
        ttl: u64,
        renewed_lease: Option<u64>,
    },
    /// The server refuses to renew this token; `ttl` 0 means it never expires.
    NotRenewable { ttl: u64 },
    Failed(VaultError),
}

impl CheckOutcome {
    pub fn next_check(&self) -> Duration {
        match self {
            CheckOutcome::Checked {
                renewed_lease: Some(lease),
                ..
            } => next_check_interval(*lease),
            CheckOutcome::Checked { ttl, .. } => next_check_interval(*ttl),
            CheckOutcome::NotRenewable { ttl: 0 } => MAX_CHECK_INTERVAL,
            CheckOutcome::NotRenewable { ttl } => next_check_interval(*ttl),
            CheckOutcome::NoToken | CheckOutcome::Failed(_) => DEFAULT_CHECK_INTERVAL,
        }
    }

    /// Badge to show, or `None` to leave it as is.
    pub fn badge(&self) -> Option<BadgeIndicator> {
        match self {
            CheckOutcome::NoToken => None,
            CheckOutcome::Checked { .. } | CheckOutcome::NotRenewable { .. } => {
                Some(BadgeIndicator::Ok)
            }
            CheckOutcome::Failed(_) => Some(BadgeIndicator::Error),
        }
    }
}

/// Look the token up and renew it when due.
pub async fn check_token<A>(api: &A, force: bool) -> CheckOutcome
where
    A: TokenApi + ?Sized,
{
    let info = match api.lookup_self().await {
        Ok(info) => info,
        Err(VaultError::MissingToken) => {
            debug!("No token stored, skipping renewal check");
            return CheckOutcome::NoToken;
        }
        Err(err) => {
            warn!(error = %err, "Token lookup failed");
            return CheckOutcome::Failed(err);
        }
    };
    info!(ttl = info.ttl, renewable = info.renewable, "Token lookup succeeded");

    if !info.renewable {
        debug!(force, "Token is not renewable, skipping renewal");
        return CheckOutcome::NotRenewable { ttl: info.ttl };
    }

    if !should_renew(info.ttl, force) {
        return CheckOutcome::Checked {
            ttl: info.ttl,
            renewed_lease: None,
        };
    }

    info!(force, "Renewing token");
    match api.renew_self(RENEW_INCREMENT).await {
        Ok(lease) => {
            info!(lease_duration = lease, "Token renewed");
            CheckOutcome::Checked {
                ttl: info.ttl,
                renewed_lease: Some(lease),
            }
        }
        Err(err) => {
            warn!(error = %err, "Token renewal failed");
            CheckOutcome::Failed(err)
        }
    }
}

/// Snapshot of the renewer published after every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewerStatus {
    pub badge: BadgeIndicator,
    pub checks: u64,
    pub last_ttl: Option<u64>,
    pub next_check: Duration,
}

/// Handle to a running renewer task.
pub struct TokenRenewerHandle {
    commands: mpsc::UnboundedSender<RenewCommand>,
    status: watch::Receiver<RenewerStatus>,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl TokenRenewerHandle {
    pub fn send(&self, command: RenewCommand) {
        if self.commands.send(command).is_err() {
            warn!(?command, "Token renewer has stopped, dropping command");
        }
    }

    pub fn rearm(&self) {
        self.send(RenewCommand::Rearm);
    }

    pub fn check_now(&self, force: bool) {
        self.send(RenewCommand::Check { force });
    }

    pub fn status(&self) -> watch::Receiver<RenewerStatus> {
        self.status.clone()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(err) = self.task.await {
            warn!(error = %err, "Token renewer task ended abnormally");
        }
    }
}

/// Spawn the renewer. The first check runs after `first_check`.
pub fn start_token_renewer(api: Arc<dyn TokenApi>, first_check: Duration) -> TokenRenewerHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(RenewerStatus {
        badge: BadgeIndicator::Ok,
        checks: 0,
        last_ttl: None,
        next_check: first_check,
    });
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        run_renewer(api, first_check, commands_rx, status_tx, shutdown_rx).await;
    });

    info!(first_check_secs = first_check.as_secs(), "Started token renewer");

    TokenRenewerHandle {
        commands: commands_tx,
        status: status_rx,
        shutdown_tx,
        task,
    }
}

async fn run_renewer(
    api: Arc<dyn TokenApi>,
    first_check: Duration,
    mut commands: mpsc::UnboundedReceiver<RenewCommand>,
    status: watch::Sender<RenewerStatus>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let timer = tokio::time::sleep(first_check);
    tokio::pin!(timer);

    loop {
        let force = tokio::select! {
            _ = &mut shutdown_rx => {
                info!("Shutting down token renewer");
                break;
            }
            command = commands.recv() => match command {
                Some(RenewCommand::Rearm) => {
                    debug!("Re-arming token check timer");
                    timer.as_mut().reset(Instant::now() + DEFAULT_CHECK_INTERVAL);
                    continue;
                }
                Some(RenewCommand::Check { force }) => force,
                None => break,
            },
            _ = &mut timer => false,
        };

        let outcome = check_token(api.as_ref(), force).await;
        let next_check = outcome.next_check();
        timer.as_mut().reset(Instant::now() + next_check);

        status.send_modify(|current| {
            if let Some(badge) = outcome.badge() {
                current.badge = badge;
            }
            if let CheckOutcome::Checked { ttl, .. } | CheckOutcome::NotRenewable { ttl } = &outcome {
                current.last_ttl = Some(*ttl);
            }
            current.checks += 1;
            current.next_check = next_check;
        });
        debug!(next_check_secs = next_check.as_secs(), "Scheduled next token check");
    }
}
