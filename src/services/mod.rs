/// Pairing lifecycle orchestration: queue, relay, ready gate, teardown.
pub mod coordinator;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Quiz session driving: rounds, answers, timers, completion.
pub mod quiz;
/// WebSocket connection and message handling service.
pub mod websocket_service;
