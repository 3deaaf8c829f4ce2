use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::units;
use crate::state::AppState;

/// Routes mounted at `/units`.
///
/// ```text
/// GET   /               -> list_units
/// GET   /{id}           -> get_unit
/// PUT   /{id}/status    -> set_unit_status
/// POST  /{id}/off-duty  -> set_unit_off_duty
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(units::list_units))
        .route("/{id}", get(units::get_unit))
        .route("/{id}/status", put(units::set_unit_status))
        .route("/{id}/off-duty", post(units::set_unit_off_duty))
}
