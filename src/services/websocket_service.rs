use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    services::{coordinator, quiz},
    state::{SharedState, client::ClientId},
};

/// Handle the full lifecycle of one client WebSocket connection.
///
/// A fresh ephemeral id is minted per connection; the client is queued for
/// matchmaking immediately and torn down when the socket closes.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Dedicated writer task keeps outbound messages flowing even while we
    // await inbound frames. Serialization happens once, here.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let payload = match serde_json::to_string(&message) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, "failed to serialize outbound message `{message:?}`");
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let client_id: ClientId = Uuid::new_v4();
    coordinator::connect(&state, client_id, outbound_tx.clone()).await;
    info!(id = %client_id, "client connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(inbound) => dispatch(&state, client_id, inbound).await,
                Err(err) => {
                    warn!(id = %client_id, error = %err, "ignoring malformed client message");
                }
            },
            Ok(Message::Close(_)) => {
                info!(id = %client_id, "client closed");
                break;
            }
            // Ping/Pong are answered by the protocol layer; binary is not
            // part of the wire protocol.
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Binary(_)) => {}
            Err(err) => {
                warn!(id = %client_id, error = %err, "websocket error");
                break;
            }
        }
    }

    coordinator::disconnect(&state, client_id).await;
    info!(id = %client_id, "client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Route one parsed inbound message to the matching coordinator operation.
async fn dispatch(state: &SharedState, id: ClientId, message: ClientMessage) {
    match message {
        ClientMessage::Signal { data } => coordinator::relay_signal(state, id, data).await,
        ClientMessage::NextStranger => coordinator::next_stranger(state, id).await,
        ClientMessage::PlayerReady => coordinator::mark_ready(state, id).await,
        ClientMessage::QuizCancel => coordinator::cancel_quiz(state, id).await,
        ClientMessage::QuizAnswer { choice } => quiz::handle_answer(state, id, choice).await,
        ClientMessage::Unknown => {
            warn!(id = %id, "ignoring unknown message type");
        }
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<ServerMessage>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
