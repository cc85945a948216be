use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Stranger Quiz Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "clients", description = "WebSocket operations for paired clients"),
    )
)]
pub struct ApiDoc;
