pub mod http;
pub mod registry;
pub mod router;
pub mod transport;

pub use registry::{ConnectionRegistry, spawn_idle_sweeper};
pub use router::Connection;
pub use transport::voice_handler;

use axum::routing::get;
use std::sync::Arc;

/// Shared state handed to every axum handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectionRegistry>,
}

/// Builds the full signaling router: the `/voice` WebSocket endpoint plus
/// the debug room inspection API.
pub fn app(registry: Arc<ConnectionRegistry>) -> axum::Router {
    let state = AppState { registry };

    axum::Router::new()
        .route("/voice", get(transport::voice_handler))
        .route("/api/rooms", get(http::list_rooms))
        .route("/api/rooms/{id}", get(http::room_detail))
        .with_state(state)
}
