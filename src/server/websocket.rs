//! WebSocket transport
//!
//! Messages are whole application-level units: an incoming text frame is a
//! question, the reply is a single binary frame carrying the MP3 answer.
//! Failures are reported to the client as a JSON text frame and the
//! connection stays open for further questions.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        ConnectInfo, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::Gateway;
use crate::config::Transport;
use crate::{Error, Result};

/// Error frame sent to the client when a question cannot be answered
#[derive(Debug, serde::Serialize)]
struct ErrorFrame<'a> {
    error: &'a str,
}

/// Build the WebSocket router
fn router(gateway: Arc<Gateway>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(ws_upgrade))
        .with_state(gateway)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve the WebSocket transport
///
/// # Errors
///
/// Returns error if the listener fails to bind or the server dies
pub async fn serve(gateway: Arc<Gateway>, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Transport(format!("failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, "WebSocket server listening");

    axum::serve(
        listener,
        router(gateway).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| Error::Transport(format!("WebSocket server error: {e}")))?;

    Ok(())
}

/// Handle WebSocket upgrade request
async fn ws_upgrade(
    State(gateway): State<Arc<Gateway>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, gateway, addr))
}

/// Handle a client connection: one question per text frame, answered in order
async fn handle_socket(mut socket: WebSocket, gateway: Arc<Gateway>, addr: SocketAddr) {
    let peer = addr.ip().to_string();
    tracing::info!(%addr, "WebSocket connected");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                match gateway.answer(Transport::WebSocket, &peer, text.as_str()).await {
                    Ok(audio) => {
                        if socket.send(Message::Binary(audio.into())).await.is_err() {
                            break;
                        }
                        tracing::info!(%addr, "audio sent to client");
                    }
                    Err(e) => {
                        tracing::error!(%addr, error = %e, "failed to answer question");
                        if send_error(&mut socket, &e.to_string()).await.is_err() {
                            break;
                        }
                    }
                }
            }
            Message::Binary(data) => {
                tracing::warn!(%addr, len = data.len(), "unexpected binary frame from client");
                if send_error(&mut socket, "expected a text question").await.is_err() {
                    break;
                }
            }
            Message::Ping(data) => {
                // axum answers pings automatically
                tracing::trace!(len = data.len(), "received ping");
            }
            Message::Close(_) => {
                tracing::info!(%addr, "WebSocket closed by client");
                break;
            }
            Message::Pong(_) => {}
        }
    }

    tracing::info!(%addr, "WebSocket disconnected");
}

/// Send a JSON error frame
async fn send_error(
    socket: &mut WebSocket,
    message: &str,
) -> std::result::Result<(), axum::Error> {
    let frame = serde_json::to_string(&ErrorFrame { error: message })
        .unwrap_or_else(|_| r#"{"error":"internal error"}"#.to_string());
    socket.send(Message::Text(frame.into())).await
}
