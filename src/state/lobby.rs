use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::{
    dto::ws::ServerMessage,
    state::{
        client::{ClientHandle, ClientId},
        session::{QuizSession, SessionId},
    },
};

/// Single-lock home of all pairing state: connected clients, the
/// matchmaking queue, and the active quiz sessions.
///
/// Every mutation happens under one lock so queue moves, partner
/// assignment, answer recording, and session advancement are atomic
/// steps relative to each other. Invariants maintained here:
///
/// - the partner relation is symmetric whenever both sides are connected,
/// - a queued client has no partner and appears in the queue at most once,
/// - a session's two members carry its id while it exists.
#[derive(Debug, Default)]
pub struct Lobby {
    clients: HashMap<ClientId, ClientHandle>,
    queue: VecDeque<ClientId>,
    sessions: HashMap<SessionId, QuizSession>,
}

impl Lobby {
    /// Create an empty lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly connected client.
    pub fn insert_client(&mut self, client: ClientHandle) {
        self.clients.insert(client.id, client);
    }

    /// Drop a client's handle entirely, returning it for inspection.
    pub fn remove_client(&mut self, id: ClientId) -> Option<ClientHandle> {
        self.clients.remove(&id)
    }

    /// Look up a client by id.
    pub fn client(&self, id: ClientId) -> Option<&ClientHandle> {
        self.clients.get(&id)
    }

    /// Look up a client by id for mutation.
    pub fn client_mut(&mut self, id: ClientId) -> Option<&mut ClientHandle> {
        self.clients.get_mut(&id)
    }

    /// Number of registered clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Resolve a client's partner id, if any.
    pub fn partner_of(&self, id: ClientId) -> Option<ClientId> {
        self.clients.get(&id).and_then(|client| client.partner)
    }

    /// Push a message to a client if it is still registered, fire-and-forget.
    pub fn notify(&self, id: ClientId, message: ServerMessage) {
        if let Some(client) = self.clients.get(&id) {
            client.notify(message);
        }
    }

    /// Append a client to the matchmaking queue.
    ///
    /// No-op when the client is unknown, already queued, or still partnered;
    /// queue entries always satisfy `partner = None`.
    pub fn enqueue(&mut self, id: ClientId) {
        let eligible = self
            .clients
            .get(&id)
            .is_some_and(|client| client.connected && client.partner.is_none());
        if eligible && !self.queue.contains(&id) {
            self.queue.push_back(id);
        }
    }

    /// Remove a client from the queue by identity; no-op if absent.
    pub fn remove_from_queue(&mut self, id: ClientId) {
        self.queue.retain(|queued| *queued != id);
    }

    /// Number of clients currently awaiting a partner.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Pair up waiting clients until fewer than two remain.
    ///
    /// The two longest-waiting clients form each pair; the first-dequeued one
    /// is designated initiator for the external signaling layer.
    pub fn try_match(&mut self) {
        while self.queue.len() >= 2 {
            let Some(first) = self.pop_waiting() else { break };
            let Some(second) = self.pop_waiting() else {
                self.queue.push_front(first);
                break;
            };
            self.pair(first, second);
        }
    }

    /// Pop queue entries until one resolves to a live client.
    fn pop_waiting(&mut self) -> Option<ClientId> {
        while let Some(id) = self.queue.pop_front() {
            if self.clients.get(&id).is_some_and(|client| client.connected) {
                return Some(id);
            }
        }
        None
    }

    fn pair(&mut self, first: ClientId, second: ClientId) {
        for id in [first, second] {
            if let Some(client) = self.clients.get_mut(&id) {
                client.reset_match_state();
            }
        }
        if let Some(client) = self.clients.get_mut(&first) {
            client.partner = Some(second);
        }
        if let Some(client) = self.clients.get_mut(&second) {
            client.partner = Some(first);
        }

        debug!(initiator = %first, partner = %second, "pairing formed");
        self.notify(first, ServerMessage::Matched { initiator: true });
        self.notify(second, ServerMessage::Matched { initiator: false });
    }

    /// Tear down a client's pairing, aborting any running session.
    ///
    /// Clears `partner`, `ready`, and `game_active` on both sides and returns
    /// the former partner's id so the caller can notify it. The partner is
    /// not re-queued; requesting a new match stays an explicit client action.
    pub fn teardown_pairing(&mut self, id: ClientId) -> Option<ClientId> {
        if let Some(session_id) = self.clients.get(&id).and_then(|client| client.session) {
            self.remove_session(session_id);
        }

        let partner_id = self.clients.get(&id).and_then(|client| client.partner)?;
        for member in [partner_id, id] {
            if let Some(client) = self.clients.get_mut(&member) {
                client.partner = None;
                client.ready = false;
                client.game_active = false;
            }
        }
        Some(partner_id)
    }

    /// Look up a session by id.
    pub fn session(&self, id: SessionId) -> Option<&QuizSession> {
        self.sessions.get(&id)
    }

    /// Look up a session by id for mutation.
    pub fn session_mut(&mut self, id: SessionId) -> Option<&mut QuizSession> {
        self.sessions.get_mut(&id)
    }

    /// Store a session and attach its id to both members.
    pub fn install_session(&mut self, session: QuizSession) -> SessionId {
        let session_id = session.id;
        for id in session.players() {
            if let Some(client) = self.clients.get_mut(&id) {
                client.session = Some(session_id);
            }
        }
        self.sessions.insert(session_id, session);
        session_id
    }

    /// Discard a session, detaching it from both members.
    ///
    /// Also clears `game_active` on whichever members remain connected, so a
    /// removed session leaves no trace that would block a future handshake.
    pub fn remove_session(&mut self, id: SessionId) -> Option<QuizSession> {
        let session = self.sessions.remove(&id)?;
        for member in session.players() {
            if let Some(client) = self.clients.get_mut(&member) {
                client.session = None;
                client.game_active = false;
            }
        }
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use uuid::Uuid;

    use super::*;

    fn join(lobby: &mut Lobby) -> (ClientId, UnboundedReceiver<ServerMessage>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        lobby.insert_client(ClientHandle::new(id, tx));
        lobby.enqueue(id);
        (id, rx)
    }

    #[test]
    fn try_match_runs_to_fixpoint() {
        let mut lobby = Lobby::new();
        let mut clients = Vec::new();
        for _ in 0..5 {
            clients.push(join(&mut lobby));
        }

        lobby.try_match();

        assert_eq!(lobby.queue_len(), 1);
        let unmatched = clients
            .iter()
            .filter(|(id, _)| lobby.partner_of(*id).is_none())
            .count();
        assert_eq!(unmatched, 1);
    }

    #[test]
    fn partner_relation_is_symmetric() {
        let mut lobby = Lobby::new();
        let (a, mut rx_a) = join(&mut lobby);
        let (b, mut rx_b) = join(&mut lobby);

        lobby.try_match();

        assert_eq!(lobby.partner_of(a), Some(b));
        assert_eq!(lobby.partner_of(b), Some(a));
        assert!(matches!(
            rx_a.try_recv(),
            Ok(ServerMessage::Matched { initiator: true })
        ));
        assert!(matches!(
            rx_b.try_recv(),
            Ok(ServerMessage::Matched { initiator: false })
        ));
    }

    #[test]
    fn enqueue_rejects_duplicates_and_partnered_clients() {
        let mut lobby = Lobby::new();
        let (a, _rx_a) = join(&mut lobby);
        let (b, _rx_b) = join(&mut lobby);

        lobby.enqueue(a);
        assert_eq!(lobby.queue_len(), 2);

        lobby.try_match();
        lobby.enqueue(a);
        assert_eq!(lobby.queue_len(), 0);
        assert_eq!(lobby.partner_of(a), Some(b));
    }

    #[test]
    fn stale_queue_entries_are_skipped() {
        let mut lobby = Lobby::new();
        let (a, _rx_a) = join(&mut lobby);
        let (b, _rx_b) = join(&mut lobby);
        let (c, _rx_c) = join(&mut lobby);
        lobby.remove_client(a);

        lobby.try_match();

        assert_eq!(lobby.partner_of(b), Some(c));
        assert_eq!(lobby.queue_len(), 0);
    }

    #[test]
    fn teardown_clears_both_sides() {
        let mut lobby = Lobby::new();
        let (a, _rx_a) = join(&mut lobby);
        let (b, _rx_b) = join(&mut lobby);
        lobby.try_match();
        lobby.client_mut(a).unwrap().ready = true;
        lobby.client_mut(b).unwrap().game_active = true;

        assert_eq!(lobby.teardown_pairing(a), Some(b));

        for id in [a, b] {
            let client = lobby.client(id).unwrap();
            assert_eq!(client.partner, None);
            assert!(!client.ready);
            assert!(!client.game_active);
        }
    }

    #[test]
    fn removing_a_session_detaches_both_members() {
        let mut lobby = Lobby::new();
        let (a, _rx_a) = join(&mut lobby);
        let (b, _rx_b) = join(&mut lobby);
        lobby.try_match();

        let session = QuizSession::new(
            a,
            b,
            vec![crate::trivia::QuizQuestion {
                prompt: "2 + 2 = ?".into(),
                options: vec!["3".into(), "4".into()],
                correct: 1,
            }],
            tokio::time::Instant::now() + std::time::Duration::from_secs(10),
        );
        let session_id = lobby.install_session(session);
        assert_eq!(lobby.client(a).unwrap().session, Some(session_id));

        assert!(lobby.remove_session(session_id).is_some());
        assert_eq!(lobby.client(a).unwrap().session, None);
        assert_eq!(lobby.client(b).unwrap().session, None);
        assert!(lobby.session(session_id).is_none());
    }
}
