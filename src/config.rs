//! Application-level configuration loading for quiz timing, scoring, and the
//! external question provider.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "STRANGER_QUIZ_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Number of questions requested from the provider per session.
    pub questions_per_session: usize,
    /// Seconds each question stays open for answers.
    pub answer_window_secs: u64,
    /// Seconds the reveal phase lasts before the next round.
    pub reveal_delay_secs: u64,
    /// Points awarded for a correct answer.
    pub points_per_correct: u32,
    /// Close a round as soon as both partners have answered. When false the
    /// round always waits out the full answer window.
    pub close_early: bool,
    /// Base URL of the multiple-choice question provider.
    pub provider_url: String,
    /// Timeout applied to provider requests.
    pub provider_timeout_secs: u64,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    ///
    /// A missing file is expected and logged at info level; unreadable or
    /// unparsable files are logged and replaced by the defaults. Never fails.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// How long each question stays open.
    pub fn answer_window(&self) -> Duration {
        Duration::from_secs(self.answer_window_secs)
    }

    /// How long the reveal phase lasts.
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_secs(self.reveal_delay_secs)
    }

    /// Timeout for a single provider request.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            questions_per_session: 4,
            answer_window_secs: 10,
            reveal_delay_secs: 2,
            points_per_correct: 5,
            close_early: true,
            provider_url: "https://opentdb.com/api.php".into(),
            provider_timeout_secs: 5,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
