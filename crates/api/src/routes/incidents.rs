use axum::routing::get;
use axum::Router;

use crate::handlers::incidents;
use crate::state::AppState;

/// Routes mounted at `/incidents`. `kind` is `leo` or `ems_fd`.
///
/// ```text
/// GET  /{kind}/{id}  -> get_incident
/// PUT  /{kind}/{id}  -> update_involved_units
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{kind}/{id}",
        get(incidents::get_incident).put(incidents::update_involved_units),
    )
}
