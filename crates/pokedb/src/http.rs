//! HTTP surface: routing, CORS, and the uniform JSON error envelope.

use crate::collection::{CollectionStore, RecordKey};
use crate::error::DbError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub pokemon: Arc<CollectionStore>,
}

impl AppState {
    pub fn new(pokemon: Arc<CollectionStore>) -> Self {
        Self { pokemon }
    }
}

/// Build the application router.
///
/// Every response except `204 No Content` carries a JSON body; failures all
/// use the `{"error": <message>}` envelope.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // Method fallbacks keep unhandled methods on known paths at 404, the
    // same answer as an unknown path.
    Router::new()
        .route(
            "/pokemon",
            get(list_records).post(create_record).fallback(unknown_route),
        )
        .route(
            "/pokemon/:id",
            get(get_record).delete(delete_record).fallback(unknown_route),
        )
        .fallback(unknown_route)
        .with_state(state)
        .layer(cors)
}

/// Bind and serve until ctrl-c or SIGTERM.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

fn error_body(message: impl Into<String>) -> Json<Value> {
    Json(json!({ "error": message.into() }))
}

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        let status = match &self {
            DbError::InvalidBody => StatusCode::BAD_REQUEST,
            DbError::NotFound => StatusCode::NOT_FOUND,
            DbError::Allocation(_) | DbError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, error_body(self.to_string())).into_response()
    }
}

async fn create_record(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    // A body that is not JSON at all never reaches the collection; it is
    // the same 400 as a JSON body that is not an object.
    let Ok(Json(body)) = body else {
        return (StatusCode::BAD_REQUEST, error_body("invalid body")).into_response();
    };
    match state.pokemon.create(body).await {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn list_records(State(state): State<AppState>) -> Response {
    match state.pokemon.list().await {
        Ok(records) => Json(records).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn get_record(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.pokemon.get(&RecordKey::parse(&id)).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn delete_record(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.pokemon.delete(&RecordKey::parse(&id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn unknown_route() -> Response {
    (StatusCode::NOT_FOUND, error_body("not found")).into_response()
}
