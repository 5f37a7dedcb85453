mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::commands::CommandRegistry;
use crate::store::VersionedStore;

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CommandRegistry>,
    pub store: VersionedStore,
}

pub fn create_router(store: VersionedStore) -> Router {
    let state = AppState {
        registry: Arc::new(CommandRegistry::from_store(store.clone())),
        store,
    };

    let api = Router::new()
        // Command catalog
        .route("/commands", get(handlers::list_commands))
        .route("/commands/{name}", post(handlers::dispatch_command))
        // Project history
        .route("/projects/{project}/history", get(handlers::project_history))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
