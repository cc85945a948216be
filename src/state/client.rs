use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{dto::ws::ServerMessage, state::session::SessionId};

/// Ephemeral identifier assigned to a client for the lifetime of its connection.
pub type ClientId = Uuid;

/// Per-connection state tracked by the lobby.
///
/// The handle wraps the connection layer's outbound sender but never owns the
/// connection itself; it is removed from the lobby when the socket closes.
#[derive(Debug)]
pub struct ClientHandle {
    /// Connection-scoped identifier.
    pub id: ClientId,
    /// Whether the underlying connection is still open. Cleared at the start
    /// of disconnect processing, before the handle is dropped.
    pub connected: bool,
    /// Identifier of the current partner, if paired. Resolved through the
    /// lobby map on every access so a departed partner reads as absent.
    pub partner: Option<ClientId>,
    /// Whether this client has completed its half of the ready handshake.
    pub ready: bool,
    /// Whether this client is part of a running quiz session.
    pub game_active: bool,
    /// Cumulative score within the current quiz session.
    pub score: u32,
    /// Back-reference to the active quiz session, if any.
    pub session: Option<SessionId>,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ClientHandle {
    /// Wrap a freshly connected client around its outbound channel.
    pub fn new(id: ClientId, tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            id,
            connected: true,
            partner: None,
            ready: false,
            game_active: false,
            score: 0,
            session: None,
            tx,
        }
    }

    /// Push a message to this client, fire-and-forget.
    ///
    /// Delivery failures mean the writer task is gone; the disconnect path
    /// will clean the handle up, so the error is dropped here.
    pub fn notify(&self, message: ServerMessage) {
        let _ = self.tx.send(message);
    }

    /// Reset the per-pairing state when the client enters a new pairing.
    pub fn reset_match_state(&mut self) {
        self.ready = false;
        self.game_active = false;
        self.score = 0;
        self.session = None;
    }
}
