//! WebSocket server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{ClientMessage, ErrorCode, ServerMessage};
use crate::storage::Storage;

use super::handlers::handle_message;
use super::state::{Connection, ServerState, SharedState};

/// Open the data directory and serve until Ctrl+C or SIGTERM.
pub async fn run(config: &Config) -> Result<()> {
    let storage = Storage::open(&config.data_dir)?;
    if config.seed {
        if storage.initialize()? {
            info!("Seeded sample data into {}", config.data_dir.display());
        }
    } else {
        storage.initialize_empty()?;
    }

    let state = Arc::new(ServerState::with_session_ttl(
        Arc::new(storage),
        config.session_ttl,
    ));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    serve(listener, state, shutdown_signal()).await;

    info!("Server shut down");
    Ok(())
}

/// Accept connections on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: SharedState, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    tokio::spawn(handle_connection(stream, addr, Arc::clone(&state)));
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                }
            },
            _ = &mut shutdown => {
                info!(
                    connections = state.connection_count(),
                    "Stopped accepting connections"
                );
                break;
            }
        }
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(stream: TcpStream, addr: SocketAddr, state: SharedState) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%addr, "WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let mut conn = Connection::new(addr);
    let id = conn.id;
    let open = state.connection_opened();
    info!(connection = %id, %addr, open, "Client connected");

    if send(&mut ws_sender, &ServerMessage::ConnectionAck).await.is_ok() {
        while let Some(msg) = ws_receiver.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    debug!(connection = %id, "Read failed: {}", e);
                    break;
                }
                _ => continue,
            };

            let reply = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(request) => match dispatch_blocking(&state, conn, request).await {
                    Some((back, reply)) => {
                        conn = back;
                        reply
                    }
                    None => break,
                },
                Err(e) => {
                    debug!(connection = %id, "Malformed request: {}", e);
                    ServerMessage::error(ErrorCode::BadRequest, format!("Malformed request: {}", e))
                }
            };

            if send(&mut ws_sender, &reply).await.is_err() {
                break;
            }
        }
    }

    let open = state.connection_closed();
    info!(connection = %id, open, "Client disconnected");
}

/// Handle a request on the blocking pool, since storage does synchronous
/// file IO under its write lock.
///
/// Returns `None` if the handler panicked; the connection is then dropped.
async fn dispatch_blocking(
    state: &SharedState,
    mut conn: Connection,
    request: ClientMessage,
) -> Option<(Connection, ServerMessage)> {
    let state = Arc::clone(state);
    let id = conn.id;
    let task = tokio::task::spawn_blocking(move || {
        let reply = handle_message(&state, &mut conn, request);
        (conn, reply)
    });

    match task.await {
        Ok(done) => Some(done),
        Err(e) => {
            error!(connection = %id, "Request handler failed: {}", e);
            None
        }
    }
}

async fn send<S>(sink: &mut S, msg: &ServerMessage) -> std::result::Result<(), ()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = serde_json::to_string(msg).map_err(|e| {
        error!("Failed to encode reply: {}", e);
    })?;
    sink.send(Message::Text(json.into())).await.map_err(|e| {
        debug!("Failed to send reply: {}", e);
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
