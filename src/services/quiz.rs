//! Drives quiz sessions: question broadcast, the answer race, timed reveal,
//! scoring, and completion.
//!
//! Timed transitions run as spawned tasks carrying a [`TimerToken`]; every
//! transition (and any teardown) invalidates outstanding tokens, so a timer
//! that fires against a stale or removed session is a guaranteed no-op.

use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::debug;

use crate::{
    dto::ws::ServerMessage,
    state::{
        SharedState,
        client::ClientId,
        lobby::Lobby,
        session::{AnswerOutcome, QuizSession, SessionId, TimerToken, winner},
    },
};

/// Start a session for a pair that just completed the ready handshake.
///
/// The question batch is fetched without holding the lobby lock; if the
/// pairing dissolves during the round-trip the session silently never starts
/// (teardown already cleared the active flags).
pub(crate) async fn start_session(state: &SharedState, first: ClientId, second: ClientId) {
    let batch = state
        .questions()
        .fetch(state.settings().questions_per_session)
        .await;

    let mut lobby = state.lobby().await;
    if !pair_intact(&lobby, first, second) {
        debug!(%first, %second, "pairing dissolved while fetching questions");
        return;
    }

    let deadline = Instant::now() + state.settings().answer_window();
    let session_id = lobby.install_session(QuizSession::new(first, second, batch, deadline));
    open_round(state, &lobby, session_id, deadline);
}

/// Record an answer submission for the current round.
///
/// Accepts the first submission per partner per round; late, duplicate, or
/// out-of-range submissions are silently ignored. A correct answer scores
/// immediately, and with the early-close policy the round closes as soon as
/// both partners have answered.
pub async fn handle_answer(state: &SharedState, id: ClientId, choice: usize) {
    let mut lobby = state.lobby().await;
    let Some(session_id) = lobby.client(id).and_then(|client| client.session) else {
        return;
    };

    let (outcome, opponent) = {
        let Some(session) = lobby.session_mut(session_id) else {
            return;
        };
        (
            session.record_answer(id, choice, Instant::now()),
            session.opponent_of(id),
        )
    };

    match outcome {
        AnswerOutcome::Accepted {
            correct,
            both_answered,
        } => {
            if correct {
                let award = state.settings().points_per_correct;
                if let Some(client) = lobby.client_mut(id) {
                    client.score += award;
                }
            }
            if let Some(opponent) = opponent {
                lobby.notify(opponent, ServerMessage::OpponentAnswered);
            }
            if both_answered && state.settings().close_early {
                close_round(state, &mut lobby, session_id);
            }
        }
        AnswerOutcome::Ignored => {
            debug!(%id, choice, "ignoring answer submission");
        }
    }
}

/// Whether both clients still form the pairing the handshake completed for.
fn pair_intact(lobby: &Lobby, first: ClientId, second: ClientId) -> bool {
    let intact = |id: ClientId, other: ClientId| {
        lobby.client(id).is_some_and(|client| {
            client.connected
                && client.partner == Some(other)
                && client.game_active
                && client.session.is_none()
        })
    };
    intact(first, second) && intact(second, first)
}

/// Broadcast the current question to both partners and arm its deadline.
fn open_round(state: &SharedState, lobby: &Lobby, session_id: SessionId, deadline: Instant) {
    let Some(session) = lobby.session(session_id) else {
        return;
    };
    let Some(question) = session.current_question() else {
        return;
    };

    let payload = ServerMessage::QuizQuestion {
        question: question.prompt.clone(),
        options: question.options.clone(),
        end_time: end_time_millis(state.settings().answer_window()),
    };
    for member in session.players() {
        lobby.notify(member, payload.clone());
    }

    arm_deadline(state, session.timer_token(), deadline);
}

/// Close the current round and broadcast the reveal to both partners.
fn close_round(state: &SharedState, lobby: &mut Lobby, session_id: SessionId) {
    let (correct_index, players, token) = {
        let Some(session) = lobby.session_mut(session_id) else {
            return;
        };
        let Some(correct_index) = session.close_round() else {
            return;
        };
        (correct_index, session.players(), session.timer_token())
    };

    for member in players {
        let score = lobby.client(member).map(|client| client.score).unwrap_or(0);
        lobby.notify(
            member,
            ServerMessage::QuizResult {
                correct_index,
                score,
            },
        );
    }

    arm_reveal(state, token, state.settings().reveal_delay());
}

/// End the session normally: final scores, winner determination, teardown.
fn finish(lobby: &mut Lobby, session_id: SessionId) {
    let Some(session) = lobby.remove_session(session_id) else {
        return;
    };
    let [first, second] = session.players();
    let first_score = lobby.client(first).map(|client| client.score).unwrap_or(0);
    let second_score = lobby
        .client(second)
        .map(|client| client.score)
        .unwrap_or(0);
    let winner = winner([(first, first_score), (second, second_score)]);

    debug!(%first, %second, first_score, second_score, "quiz session complete");
    lobby.notify(
        first,
        ServerMessage::QuizEnd {
            your_score: first_score,
            opponent_score: second_score,
            winner,
        },
    );
    lobby.notify(
        second,
        ServerMessage::QuizEnd {
            your_score: second_score,
            opponent_score: first_score,
            winner,
        },
    );
}

fn arm_deadline(state: &SharedState, token: TimerToken, deadline: Instant) {
    let state = state.clone();
    tokio::spawn(async move {
        sleep_until(deadline).await;
        let mut lobby = state.lobby().await;
        let still_open = lobby
            .session(token.session)
            .is_some_and(|session| session.accepts(&token));
        if still_open {
            close_round(&state, &mut lobby, token.session);
        }
    });
}

fn arm_reveal(state: &SharedState, token: TimerToken, delay: Duration) {
    let state = state.clone();
    tokio::spawn(async move {
        sleep(delay).await;
        let mut lobby = state.lobby().await;

        let deadline = Instant::now() + state.settings().answer_window();
        let advanced = {
            let Some(session) = lobby.session_mut(token.session) else {
                return;
            };
            if !session.accepts(&token) {
                return;
            }
            session.advance(deadline).is_some()
        };

        if advanced {
            open_round(&state, &lobby, token.session, deadline);
        } else {
            finish(&mut lobby, token.session);
        }
    });
}

/// Wall-clock submission deadline advertised to clients, in Unix milliseconds.
fn end_time_millis(window: Duration) -> i64 {
    let end = OffsetDateTime::now_utc() + window;
    (end.unix_timestamp_nanos() / 1_000_000) as i64
}
