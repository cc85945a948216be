use std::collections::HashMap;

use tokio::time::Instant;
use uuid::Uuid;

use crate::{state::client::ClientId, trivia::QuizQuestion};

/// Identifier of a quiz session, unique per pairing attempt.
pub type SessionId = Uuid;

/// Phase of the current round within a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// The question is open for answers until the deadline.
    Question {
        /// Hard deadline after which submissions are ignored.
        deadline: Instant,
    },
    /// The correct answer has been disclosed; waiting out the reveal delay.
    Revealing,
}

/// Cancellation token carried by every scheduled timer.
///
/// A timer callback resolves its session through the lobby and then calls
/// [`QuizSession::accepts`]; a token minted before any later transition (or
/// before teardown, which removes the session entirely) no longer matches
/// and the callback is a guaranteed no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    /// Session the timer was scheduled against.
    pub session: SessionId,
    epoch: u64,
}

/// Outcome of an answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// The answer was recorded as this client's single answer for the round.
    Accepted {
        /// Whether the chosen option was the correct one.
        correct: bool,
        /// Whether both partners have now answered this round.
        both_answered: bool,
    },
    /// Late, duplicate, out-of-range, or out-of-phase submission.
    Ignored,
}

/// Per-pair quiz state machine.
///
/// Drives `Question(i) -> Revealing(i) -> Question(i+1) -> ... -> Ended`;
/// the owning coordinator destroys the session on completion or teardown,
/// so `Ended` is represented by removal rather than a phase value.
#[derive(Debug)]
pub struct QuizSession {
    /// Session identifier.
    pub id: SessionId,
    players: [ClientId; 2],
    questions: Vec<QuizQuestion>,
    round: usize,
    phase: RoundPhase,
    answers: HashMap<ClientId, usize>,
    epoch: u64,
}

impl QuizSession {
    /// Open a session on its first question with the given answer deadline.
    pub fn new(
        first: ClientId,
        second: ClientId,
        questions: Vec<QuizQuestion>,
        deadline: Instant,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            players: [first, second],
            questions,
            round: 0,
            phase: RoundPhase::Question { deadline },
            answers: HashMap::new(),
            epoch: 0,
        }
    }

    /// Both participants of the session.
    pub fn players(&self) -> [ClientId; 2] {
        self.players
    }

    /// The other participant, or `None` for a non-member.
    pub fn opponent_of(&self, id: ClientId) -> Option<ClientId> {
        match self.players {
            [a, b] if a == id => Some(b),
            [a, b] if b == id => Some(a),
            _ => None,
        }
    }

    /// Zero-based index of the current round.
    pub fn round(&self) -> usize {
        self.round
    }

    /// Current round phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// The question currently being played, if the batch is not exhausted.
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.round)
    }

    /// Mint a token tied to the current phase of this session.
    pub fn timer_token(&self) -> TimerToken {
        TimerToken {
            session: self.id,
            epoch: self.epoch,
        }
    }

    /// Whether a timer scheduled with `token` is still allowed to act.
    pub fn accepts(&self, token: &TimerToken) -> bool {
        token.session == self.id && token.epoch == self.epoch
    }

    /// Record an answer for the current round.
    ///
    /// At most one answer per client per round is kept; submissions after the
    /// deadline, outside the question phase, with an out-of-range index, or
    /// from a non-member are ignored regardless of arrival order.
    pub fn record_answer(&mut self, who: ClientId, choice: usize, now: Instant) -> AnswerOutcome {
        let RoundPhase::Question { deadline } = self.phase else {
            return AnswerOutcome::Ignored;
        };
        if now > deadline || !self.players.contains(&who) || self.answers.contains_key(&who) {
            return AnswerOutcome::Ignored;
        }
        let Some(question) = self.questions.get(self.round) else {
            return AnswerOutcome::Ignored;
        };
        if choice >= question.options.len() {
            return AnswerOutcome::Ignored;
        }

        self.answers.insert(who, choice);
        AnswerOutcome::Accepted {
            correct: choice == question.correct,
            both_answered: self.answers.len() == self.players.len(),
        }
    }

    /// Whether the given client has already answered the current round.
    pub fn has_answered(&self, id: ClientId) -> bool {
        self.answers.contains_key(&id)
    }

    /// Close the current round, moving to the reveal phase.
    ///
    /// Invalidates outstanding timers and returns the correct option index
    /// for the reveal broadcast. Returns `None` if no round is open.
    pub fn close_round(&mut self) -> Option<usize> {
        if !matches!(self.phase, RoundPhase::Question { .. }) {
            return None;
        }
        let correct = self.questions.get(self.round).map(|q| q.correct)?;
        self.phase = RoundPhase::Revealing;
        self.epoch += 1;
        Some(correct)
    }

    /// Advance from the reveal phase to the next question.
    ///
    /// Returns the opened question, or `None` when the batch is exhausted and
    /// the session has ended. Either way outstanding timers are invalidated.
    pub fn advance(&mut self, deadline: Instant) -> Option<&QuizQuestion> {
        self.epoch += 1;
        self.round += 1;
        self.answers.clear();
        if self.round < self.questions.len() {
            self.phase = RoundPhase::Question { deadline };
            self.questions.get(self.round)
        } else {
            None
        }
    }
}

/// Determine the winner by strict score comparison; a tie has no winner.
pub fn winner(scores: [(ClientId, u32); 2]) -> Option<ClientId> {
    let [(first, first_score), (second, second_score)] = scores;
    match first_score.cmp(&second_score) {
        std::cmp::Ordering::Greater => Some(first),
        std::cmp::Ordering::Less => Some(second),
        std::cmp::Ordering::Equal => None,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn questions(count: usize) -> Vec<QuizQuestion> {
        (0..count)
            .map(|i| QuizQuestion {
                prompt: format!("question {i}"),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct: 1,
            })
            .collect()
    }

    fn session(count: usize) -> (QuizSession, ClientId, ClientId, Instant) {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Instant::now();
        let session = QuizSession::new(a, b, questions(count), now + Duration::from_secs(10));
        (session, a, b, now)
    }

    #[test]
    fn first_answer_per_client_is_kept() {
        let (mut session, a, _, now) = session(1);

        assert_eq!(
            session.record_answer(a, 1, now),
            AnswerOutcome::Accepted {
                correct: true,
                both_answered: false,
            }
        );
        assert_eq!(session.record_answer(a, 0, now), AnswerOutcome::Ignored);
        assert!(session.has_answered(a));
    }

    #[test]
    fn late_answer_is_ignored() {
        let (mut session, a, _, now) = session(1);
        let after_deadline = now + Duration::from_secs(11);
        assert_eq!(
            session.record_answer(a, 1, after_deadline),
            AnswerOutcome::Ignored
        );
    }

    #[test]
    fn out_of_range_choice_is_ignored() {
        let (mut session, a, _, now) = session(1);
        assert_eq!(session.record_answer(a, 4, now), AnswerOutcome::Ignored);
    }

    #[test]
    fn non_member_cannot_answer() {
        let (mut session, _, _, now) = session(1);
        assert_eq!(
            session.record_answer(Uuid::new_v4(), 1, now),
            AnswerOutcome::Ignored
        );
    }

    #[test]
    fn second_answer_reports_both_answered() {
        let (mut session, a, b, now) = session(1);
        session.record_answer(a, 0, now);
        assert_eq!(
            session.record_answer(b, 1, now),
            AnswerOutcome::Accepted {
                correct: true,
                both_answered: true,
            }
        );
    }

    #[test]
    fn closing_invalidates_earlier_timers_and_blocks_answers() {
        let (mut session, a, _, now) = session(2);
        let token = session.timer_token();

        assert_eq!(session.close_round(), Some(1));
        assert!(!session.accepts(&token));
        assert_eq!(session.record_answer(a, 1, now), AnswerOutcome::Ignored);
        // A round can only be closed once.
        assert_eq!(session.close_round(), None);
    }

    #[test]
    fn advance_walks_the_batch_then_ends() {
        let (mut session, a, b, now) = session(2);
        session.record_answer(a, 1, now);
        session.record_answer(b, 0, now);
        session.close_round();

        let deadline = now + Duration::from_secs(10);
        assert!(session.advance(deadline).is_some());
        assert_eq!(session.round(), 1);
        // Answer state is per-round.
        assert!(!session.has_answered(a));

        session.close_round();
        assert!(session.advance(deadline).is_none());
    }

    #[test]
    fn winner_requires_a_strictly_higher_score() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(winner([(a, 10), (b, 5)]), Some(a));
        assert_eq!(winner([(a, 5), (b, 10)]), Some(b));
        assert_eq!(winner([(a, 5), (b, 5)]), None);
    }
}
