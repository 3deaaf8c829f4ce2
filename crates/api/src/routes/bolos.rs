use axum::routing::{get, put};
use axum::Router;

use crate::handlers::bolos;
use crate::state::AppState;

/// Routes mounted at `/bolos`.
///
/// ```text
/// GET     /      -> list_bolos
/// POST    /      -> create_bolo
/// PUT     /{id}  -> update_bolo
/// DELETE  /{id}  -> delete_bolo
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(bolos::list_bolos).post(bolos::create_bolo))
        .route("/{id}", put(bolos::update_bolo).delete(bolos::delete_bolo))
}
