pub mod bolos;
pub mod health;
pub mod incidents;
pub mod units;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                              WebSocket (dispatch clients)
///
/// /units                           list (runs the inactivity sweep first)
/// /units/{id}/status               set status (PUT)
/// /units/{id}/off-duty             off-duty toggle (POST)
///
/// /incidents/{kind}/{id}           get, reconcile involved units (PUT)
///
/// /bolos                           list (expires stale BOLOs first), create
/// /bolos/{id}                      update, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/units", units::router())
        .nest("/incidents", incidents::router())
        .nest("/bolos", bolos::router())
}
