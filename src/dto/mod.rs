/// Health check payloads.
pub mod health;
/// WebSocket wire protocol messages.
pub mod ws;
