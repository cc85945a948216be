//! Wires connection lifecycle events to the matchmaking queue, signal relay,
//! ready gate, and quiz sessions.

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::info;

use crate::{
    dto::ws::ServerMessage,
    services::quiz,
    state::{
        SharedState,
        client::{ClientHandle, ClientId},
    },
};

/// Register a freshly connected client, queue it, and attempt a match.
pub async fn connect(state: &SharedState, id: ClientId, tx: mpsc::UnboundedSender<ServerMessage>) {
    let mut lobby = state.lobby().await;
    lobby.insert_client(ClientHandle::new(id, tx));
    lobby.enqueue(id);
    lobby.try_match();
}

/// Handle a closed connection.
///
/// Leaves the queue, tears down the pairing (notifying the former partner),
/// and discards the client's handle. Any running quiz session aborts without
/// a `quiz-end`.
pub async fn disconnect(state: &SharedState, id: ClientId) {
    let mut lobby = state.lobby().await;
    if let Some(client) = lobby.client_mut(id) {
        client.connected = false;
    }
    lobby.remove_from_queue(id);
    if let Some(partner) = lobby.teardown_pairing(id) {
        info!(%id, %partner, "pairing torn down by disconnect");
        lobby.notify(partner, ServerMessage::PartnerDisconnected);
    }
    lobby.remove_client(id);
}

/// Abandon the current partner and re-enter the matchmaking queue.
pub async fn next_stranger(state: &SharedState, id: ClientId) {
    let mut lobby = state.lobby().await;
    lobby.remove_from_queue(id);
    if let Some(partner) = lobby.teardown_pairing(id) {
        info!(%id, %partner, "pairing abandoned for a new partner");
        lobby.notify(partner, ServerMessage::PartnerDisconnected);
    }
    lobby.enqueue(id);
    lobby.try_match();
}

/// Forward an opaque signaling payload to the partner.
///
/// The payload is never inspected; without a partner this is a silent no-op.
pub async fn relay_signal(state: &SharedState, id: ClientId, data: Value) {
    let lobby = state.lobby().await;
    if let Some(partner) = lobby.partner_of(id) {
        lobby.notify(partner, ServerMessage::Signal { data });
    }
}

/// Ready gate: record readiness and start a quiz once both sides are ready.
///
/// Starting flips `game_active` on both clients before anything is awaited,
/// so a duplicate both-ready condition from redundant events cannot start a
/// second session. Without a partner this is a silent no-op.
pub async fn mark_ready(state: &SharedState, id: ClientId) {
    let pair = {
        let mut lobby = state.lobby().await;
        let Some(partner_id) = lobby.partner_of(id) else {
            return;
        };
        if let Some(client) = lobby.client_mut(id) {
            client.ready = true;
        }

        let self_idle = lobby.client(id).is_some_and(|client| !client.game_active);
        let partner_set = lobby
            .client(partner_id)
            .is_some_and(|partner| partner.ready && !partner.game_active);
        if !(self_idle && partner_set) {
            return;
        }

        for member in [id, partner_id] {
            if let Some(client) = lobby.client_mut(member) {
                client.ready = false;
                client.game_active = true;
                client.score = 0;
            }
        }
        info!(%id, partner = %partner_id, "ready handshake complete");
        lobby.notify(id, ServerMessage::BothReady);
        lobby.notify(partner_id, ServerMessage::BothReady);
        (id, partner_id)
    };

    quiz::start_session(state, pair.0, pair.1).await;
}

/// Abort a pending ready handshake or a running quiz session.
///
/// Clears the ready and active flags on both sides and notifies the partner;
/// an in-flight session is discarded without a `quiz-end`.
pub async fn cancel_quiz(state: &SharedState, id: ClientId) {
    let mut lobby = state.lobby().await;
    if let Some(session_id) = lobby.client(id).and_then(|client| client.session) {
        lobby.remove_session(session_id);
    }
    if let Some(client) = lobby.client_mut(id) {
        client.ready = false;
        client.game_active = false;
    }
    if let Some(partner_id) = lobby.partner_of(id) {
        if let Some(partner) = lobby.client_mut(partner_id) {
            partner.ready = false;
            partner.game_active = false;
        }
        lobby.notify(partner_id, ServerMessage::QuizCancelled);
    }
}
