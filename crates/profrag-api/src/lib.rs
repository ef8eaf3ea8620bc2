//! profrag API - HTTP server
//!
//! Exposes the professor recommendation pipeline as a streaming chat
//! endpoint, alongside health probes and OpenAPI documentation.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{extract::DefaultBodyLimit, Router};
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI document
#[derive(OpenApi)]
#[openapi(
    info(
        title = "profrag API",
        description = "Professor recommendations backed by retrieval-augmented generation"
    ),
    paths(
        handlers::chat::chat_handler,
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::health::metrics,
    ),
    components(schemas(
        handlers::chat::MessageSchema,
        handlers::health::HealthResponse,
        handlers::health::ReadinessResponse,
        handlers::health::ReadinessChecks,
        handlers::health::MetricsResponse,
        error::ApiError,
    )),
    tags(
        (name = "chat", description = "Streaming recommendations"),
        (name = "health", description = "Probes and counters")
    )
)]
pub struct ApiDoc;

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .nest("/api", routes::api_routes())
        .merge(routes::health_routes())
        .layer(DefaultBodyLimit::max(state.config.server.max_body_size))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::metrics_middleware,
        ));

    if let Some(cors) = middleware::cors_layer(&state.config.server) {
        app = app.layer(cors);
    }

    app.layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Router backed by in-memory providers, for integration tests
#[cfg(feature = "test-utils")]
pub fn create_router_for_testing() -> Router {
    use profrag_core::config::AppConfig;
    use profrag_core::testing::{ScriptedChat, StaticEmbedder, StaticIndex};
    use profrag_rag::ProfessorRag;

    let mut config = AppConfig::default();
    config.openai.api_key = Some("test-openai-key".to_string());
    config.pinecone.api_key = Some("test-pinecone-key".to_string());

    let rag = ProfessorRag::new(
        Arc::new(StaticEmbedder::default()),
        Arc::new(StaticIndex::default()),
        Arc::new(ScriptedChat::default()),
        config.rag.clone(),
    );

    create_router(Arc::new(AppState::new(config, rag)))
}
