//! Shared application state: the lobby behind its single lock plus the
//! immutable configuration and question source.

/// Per-connection client handles.
pub mod client;
/// Matchmaking queue, client registry, and session store.
pub mod lobby;
/// Per-pair quiz session state machine.
pub mod session;

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::{config::AppConfig, state::lobby::Lobby, trivia::QuestionSource};

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state shared by the transport layer and services.
pub struct AppState {
    lobby: Mutex<Lobby>,
    questions: QuestionSource,
    settings: AppConfig,
}

impl AppState {
    /// Construct the state wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(settings: AppConfig, questions: QuestionSource) -> SharedState {
        Arc::new(Self {
            lobby: Mutex::new(Lobby::new()),
            questions,
            settings,
        })
    }

    /// Acquire the lobby lock.
    ///
    /// Callers must not hold the guard across an await point; the quiz start
    /// path explicitly drops it around the provider round-trip.
    pub async fn lobby(&self) -> MutexGuard<'_, Lobby> {
        self.lobby.lock().await
    }

    /// Runtime configuration.
    pub fn settings(&self) -> &AppConfig {
        &self.settings
    }

    /// Question source backing new quiz sessions.
    pub fn questions(&self) -> &QuestionSource {
        &self.questions
    }
}
