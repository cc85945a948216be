use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::client::ClientId;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from connected WebSocket clients.
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Opaque signaling payload to forward verbatim to the partner.
    Signal {
        /// Arbitrary JSON blob; never inspected by the server.
        #[schema(value_type = Object)]
        data: serde_json::Value,
    },
    /// Abandon the current partner and re-enter the matchmaking queue.
    NextStranger,
    /// Declare readiness for a quiz session with the current partner.
    PlayerReady,
    /// Abort a pending ready handshake or a running quiz session.
    QuizCancel,
    /// Submit an answer for the current quiz round.
    QuizAnswer {
        /// Index into the options list of the current question.
        choice: usize,
    },
    #[serde(other)]
    /// Any unrecognized message type; ignored.
    Unknown,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Messages pushed to connected WebSocket clients.
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// A pairing has been formed for this client.
    Matched {
        /// Whether this client should initiate the external peer connection.
        initiator: bool,
    },
    /// Opaque signaling payload forwarded from the partner.
    Signal {
        /// The partner's payload, unmodified.
        #[schema(value_type = Object)]
        data: serde_json::Value,
    },
    /// The former partner left or requested a new partner.
    PartnerDisconnected,
    /// Both sides of the pairing are ready; a quiz session is starting.
    BothReady,
    /// The partner aborted the quiz handshake or session.
    QuizCancelled,
    /// A new quiz round has opened.
    #[serde(rename_all = "camelCase")]
    QuizQuestion {
        /// Prompt text, already entity-decoded.
        question: String,
        /// Answer options in presentation order.
        options: Vec<String>,
        /// Hard submission deadline as Unix milliseconds.
        end_time: i64,
    },
    /// The partner has submitted an answer for the current round.
    OpponentAnswered,
    /// Round reveal: the correct option and this client's running score.
    #[serde(rename_all = "camelCase")]
    QuizResult {
        /// Index of the correct option in the presented order.
        correct_index: usize,
        /// This client's cumulative score after the round.
        score: u32,
    },
    /// The quiz session has completed normally.
    #[serde(rename_all = "camelCase")]
    QuizEnd {
        /// This client's final score.
        your_score: u32,
        /// The opponent's final score.
        opponent_score: u32,
        /// Identifier of the winning client; absent on a draw.
        #[serde(skip_serializing_if = "Option::is_none")]
        #[schema(value_type = Option<uuid::Uuid>)]
        winner: Option<ClientId>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_events_use_kebab_case_tags() {
        let message: ClientMessage =
            serde_json::from_str(r#"{"type":"quiz-answer","choice":2}"#).unwrap();
        assert!(matches!(message, ClientMessage::QuizAnswer { choice: 2 }));

        let message: ClientMessage = serde_json::from_str(r#"{"type":"next-stranger"}"#).unwrap();
        assert!(matches!(message, ClientMessage::NextStranger));
    }

    #[test]
    fn unrecognized_inbound_type_maps_to_unknown() {
        let message: ClientMessage = serde_json::from_str(r#"{"type":"mystery"}"#).unwrap();
        assert!(matches!(message, ClientMessage::Unknown));
    }

    #[test]
    fn question_payload_uses_camel_case_fields() {
        let payload = serde_json::to_value(ServerMessage::QuizQuestion {
            question: "2 + 2 = ?".into(),
            options: vec!["3".into(), "4".into()],
            end_time: 1_700_000_000_000,
        })
        .unwrap();
        assert_eq!(payload["type"], "quiz-question");
        assert_eq!(payload["endTime"], 1_700_000_000_000i64);
    }

    #[test]
    fn draw_omits_the_winner_field() {
        let payload = serde_json::to_value(ServerMessage::QuizEnd {
            your_score: 5,
            opponent_score: 5,
            winner: None,
        })
        .unwrap();
        assert!(payload.get("winner").is_none());
        assert_eq!(payload["yourScore"], 5);
    }
}
