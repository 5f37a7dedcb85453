use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::AppState;
use crate::error::{CommandError, StoreError};
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Map a dispatch failure to a status code.
///
/// Caller mistakes (unknown command, bad attributes, paths outside the
/// project, missing files, wrong file kinds, existing projects) are returned
/// with their message.
/// Anything else is logged server-side and reported as a generic 500 so
/// subprocess output and host paths do not leak to the client.
fn command_error(e: CommandError) -> (StatusCode, String) {
    let status = match &e {
        CommandError::UnknownCommand(_) => StatusCode::NOT_FOUND,
        CommandError::Validation { .. } => StatusCode::BAD_REQUEST,
        CommandError::Store(store) => return store_error(store),
    };
    tracing::warn!("Rejected request: {}", e);
    (status, e.to_string())
}

fn store_error(e: &StoreError) -> (StatusCode, String) {
    let status = match e {
        StoreError::PathEscape { .. } | StoreError::NoTestCommand { .. } => StatusCode::BAD_REQUEST,
        e if e.is_invalid_target() => StatusCode::BAD_REQUEST,
        StoreError::AlreadyExists { .. } => StatusCode::CONFLICT,
        e if e.is_not_found() => {
            tracing::warn!("Not found: {}", e);
            return (StatusCode::NOT_FOUND, "Not found".to_string());
        }
        _ => {
            tracing::error!("Internal error: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            );
        }
    };
    tracing::warn!("Rejected request: {}", e);
    (status, e.to_string())
}

fn join_error(e: tokio::task::JoinError) -> (StatusCode, String) {
    tracing::error!("Blocking task failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Commands
// ============================================================

pub async fn list_commands(State(state): State<AppState>) -> Json<Vec<CommandInfo>> {
    Json(state.registry.catalog())
}

pub async fn dispatch_command(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(input): Json<DispatchInput>,
) -> Result<String, (StatusCode, String)> {
    let registry = state.registry.clone();
    tokio::task::spawn_blocking(move || {
        registry.dispatch(&name, &input.attributes, input.body.as_deref())
    })
    .await
    .map_err(join_error)?
    .map_err(command_error)
}

// ============================================================
// History
// ============================================================

pub async fn project_history(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> Result<Json<Vec<CommitSummary>>, (StatusCode, String)> {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || store.history(&project))
        .await
        .map_err(join_error)?
        .map(Json)
        .map_err(|e| store_error(&e))
}
