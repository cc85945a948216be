use rand::{Rng, seq::SliceRandom};
use serde::Deserialize;
use thiserror::Error;

use crate::trivia::QuizQuestion;

/// Failures while fetching from the question provider.
///
/// All variants are recovered locally via the fallback set and never surface
/// to clients.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport failure, timeout, or non-success HTTP status.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The provider answered but signalled an application-level error.
    #[error("provider signalled error code {0}")]
    ErrorCode(u8),
    /// The response decoded but contained no usable question records.
    #[error("provider returned no usable questions")]
    Empty,
}

/// Top-level provider response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderResponse {
    pub response_code: u8,
    #[serde(default)]
    pub results: Vec<ProviderQuestion>,
}

/// One raw question record as delivered by the provider.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderQuestion {
    pub question: String,
    pub correct_answer: String,
    #[serde(default)]
    pub incorrect_answers: Vec<String>,
}

impl ProviderQuestion {
    /// Turn a raw record into a playable question.
    ///
    /// Returns `None` for records without any incorrect answers, since a
    /// question needs at least two options.
    pub(crate) fn into_question<R: Rng + ?Sized>(self, rng: &mut R) -> Option<QuizQuestion> {
        if self.incorrect_answers.is_empty() {
            return None;
        }

        let prompt = decode(&self.question);
        let correct = decode(&self.correct_answer);
        let incorrect = self
            .incorrect_answers
            .iter()
            .map(|text| decode(text))
            .collect();
        let (options, correct) = shuffle_options(correct, incorrect, rng);
        Some(QuizQuestion {
            prompt,
            options,
            correct,
        })
    }
}

/// Decode HTML entities the provider embeds in its text fields.
pub(crate) fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Shuffle the options uniformly and recompute the correct index.
///
/// Tracks the correct entry through the shuffle by tag rather than by text,
/// so a correct answer that duplicates an incorrect one stays unambiguous.
pub(crate) fn shuffle_options<R: Rng + ?Sized>(
    correct: String,
    incorrect: Vec<String>,
    rng: &mut R,
) -> (Vec<String>, usize) {
    let mut entries: Vec<(bool, String)> = incorrect
        .into_iter()
        .map(|text| (false, text))
        .collect();
    entries.push((true, correct));
    entries.shuffle(rng);

    let correct_index = entries
        .iter()
        .position(|(is_correct, _)| *is_correct)
        .unwrap_or(0);
    let options = entries.into_iter().map(|(_, text)| text).collect();
    (options, correct_index)
}
