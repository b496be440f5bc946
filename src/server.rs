use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    routing::get,
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::gateway::{ChatGateway, ChatReply, ChatRequest, ClearReply, ClearRequest};
use crate::llm::ChatCompletionsDriver;

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let settings = config.llm_settings()?;

    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        provider = ?settings.provider,
        "LLM configuration loaded"
    );

    let driver = Arc::new(ChatCompletionsDriver::new(settings));
    let gateway = ChatGateway::new(driver, config.gateway_options());
    let app = build_router(AppState { gateway });

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        debug = config.server.debug,
        "Server started"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Build the HTTP router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/chat", axum::routing::post(api_chat).delete(api_clear_chat))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Service banner.
async fn root() -> Json<Value> {
    Json(json!({
        "status": "API is running",
        "endpoints": ["/api/chat", "/health"],
    }))
}

/// GET /health - Liveness probe.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Medical Assistant API is running",
    }))
}

/// POST /api/chat - Send a message and get the assistant reply.
async fn api_chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatReply>, ApiError> {
    let req: ChatRequest = parse_body(&body)?;
    let reply = state.gateway.handle_chat(req).await?;
    Ok(Json(reply))
}

/// DELETE /api/chat - Clear a session's history.
async fn api_clear_chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ClearReply>, ApiError> {
    let req: ClearRequest = parse_body(&body)?;
    let reply = state.gateway.clear_session(req).await?;
    Ok(Json(reply))
}

/// Decode a JSON request body.
///
/// An empty body, `null`, a non-object or `{}` all decode to `T::default()`
/// so the gateway reports the missing field. Malformed JSON is an internal
/// error.
fn parse_body<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    let value: Value = serde_json::from_slice(body)?;
    match value {
        Value::Object(map) if !map.is_empty() => Ok(serde_json::from_value(Value::Object(map))?),
        _ => Ok(T::default()),
    }
}
