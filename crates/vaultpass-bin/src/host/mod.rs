//! Native-messaging host.
//!
//! The browser starts the binary with stdin/stdout connected to the
//! extension. Every reply and badge update goes through one writer task so
//! frames never interleave.

mod handler;

pub use handler::{badge_message, MessageHandler};

use crate::context::{AppContext, StoredTokenApi};
use anyhow::Result;
use extension_protocol::{read_message, write_message, ExtensionMessage, NotifyLevel, ProtocolError};
use std::sync::Arc;
use token_lifecycle::{start_token_renewer, DEFAULT_CHECK_INTERVAL};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Serve the extension over the process's stdin and stdout.
pub async fn run(context: Arc<AppContext>) -> Result<()> {
    serve(context, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve messages from `reader` until the browser closes it.
pub async fn serve<R, W>(context: Arc<AppContext>, mut reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<ExtensionMessage>();

    let writer_task = tokio::spawn(async move {
        while let Some(message) = outgoing_rx.recv().await {
            match write_message(&mut writer, &message).await {
                Ok(()) => {}
                Err(ProtocolError::MessageTooLarge { len, limit }) => {
                    warn!(kind = message.kind(), len, limit, "Dropped oversized reply");
                }
                Err(err) => {
                    error!(error = %err, "Writing to the browser failed");
                    break;
                }
            }
        }
    });

    let api = Arc::new(StoredTokenApi::new(context.clone()));
    let handler = MessageHandler::new(context, start_token_renewer(api, DEFAULT_CHECK_INTERVAL));

    let badge_task = tokio::spawn({
        let mut status = handler.renewer().status();
        let outgoing = outgoing_tx.clone();
        async move {
            let mut shown = status.borrow().badge;
            while status.changed().await.is_ok() {
                let badge = status.borrow_and_update().badge;
                if badge != shown {
                    shown = badge;
                    if outgoing.send(badge_message(badge)).is_err() {
                        break;
                    }
                }
            }
        }
    });

    info!("Native messaging host started");
    let result = loop {
        let message = match read_message(&mut reader).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                info!("Browser closed the connection");
                break Ok(());
            }
            Err(err @ (ProtocolError::Json(_) | ProtocolError::Protocol(_))) => {
                warn!(error = %err, "Ignoring undecodable message");
                let reply = ExtensionMessage::notify(NotifyLevel::Error, err.to_string());
                if outgoing_tx.send(reply).is_err() {
                    break Ok(());
                }
                continue;
            }
            Err(err) => break Err(err.into()),
        };

        debug!(kind = message.kind(), "Handling message");
        let mut closed = false;
        for reply in handler.handle(message).await {
            if outgoing_tx.send(reply).is_err() {
                closed = true;
                break;
            }
        }
        if closed {
            warn!("Writer stopped, shutting down host");
            break Ok(());
        }
    };

    handler.shutdown().await;
    badge_task.abort();
    drop(outgoing_tx);
    if let Err(err) = writer_task.await {
        warn!(error = %err, "Writer task ended abnormally");
    }
    info!("Native messaging host stopped");
    result
}
