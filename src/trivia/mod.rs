//! Multiple-choice question sourcing: an external provider with a built-in
//! fallback set, entity decoding, and option shuffling.

/// Built-in question set used when the provider is unreachable.
pub mod fallback;
/// Provider wire format, decoding, and option shuffling.
pub mod provider;

use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use self::provider::{ProviderError, ProviderResponse};

/// One multiple-choice question ready for play.
///
/// Options are already uniformly reshuffled with `correct` recomputed after
/// the shuffle, and all text is entity-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    /// Prompt text.
    pub prompt: String,
    /// Answer options in presentation order, at least two.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct: usize,
}

/// Fetches question batches from the external provider.
#[derive(Debug, Clone)]
pub struct QuestionSource {
    client: Client,
    url: String,
}

impl QuestionSource {
    /// Build a source against the given provider base URL.
    pub fn new(provider_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: provider_url.into(),
        })
    }

    /// Retrieve `count` questions, substituting the built-in fallback set on
    /// any provider failure. This call never fails outward.
    pub async fn fetch(&self, count: usize) -> Vec<QuizQuestion> {
        match self.fetch_from_provider(count).await {
            Ok(questions) => questions,
            Err(err) => {
                warn!(error = %err, "question provider unavailable; using the built-in set");
                fallback::questions()
            }
        }
    }

    async fn fetch_from_provider(&self, count: usize) -> Result<Vec<QuizQuestion>, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("amount", count.to_string()),
                ("type", "multiple".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body: ProviderResponse = response.json().await?;

        if body.response_code != 0 {
            return Err(ProviderError::ErrorCode(body.response_code));
        }

        let mut rng = rand::rng();
        let questions: Vec<QuizQuestion> = body
            .results
            .into_iter()
            .filter_map(|record| record.into_question(&mut rng))
            .collect();
        if questions.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(questions)
    }
}
