//! WebSocket progress feed: the observer gateway.
//!
//! Each connection subscribes to the progress bus on upgrade and holds its
//! own receiver; the forwarding loop below is the only code touching that
//! receiver, so observers join and leave without any shared registry to
//! lock. Exiting the loop drops the receiver, which unregisters the
//! observer — send failures are therefore self-healing and never affect
//! delivery to other connections.

use crate::api::AppState;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::select;

/// Idle heartbeat interval; keeps intermediaries from reaping quiet
/// connections between downloads.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// GET /ws/progress - WebSocket progress feed
///
/// The server pushes one JSON frame per progress event. There is no
/// client-to-server payload protocol beyond connect/disconnect; pings are
/// answered and everything else is ignored.
pub async fn progress_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forward bus events to one observer until it disconnects or a send fails.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let mut events = state.downloader.subscribe();
    tracing::debug!(
        observers = state.downloader.bus().observer_count(),
        "progress observer connected"
    );

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick fires immediately; swallow it so the heartbeat is
    // actually periodic.
    heartbeat.tick().await;

    loop {
        select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let json = match serde_json::to_string(&event) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to serialize progress event");
                                continue;
                            }
                        };
                        if sender.send(Message::Text(json)).await.is_err() {
                            // Send failure unsubscribes this observer; other
                            // observers are unaffected.
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "progress observer lagged");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }

            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "progress observer socket error");
                        break;
                    }
                    // No client-to-server protocol; ignore text/binary/pong
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("progress observer disconnected");
}
