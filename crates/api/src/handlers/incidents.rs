//! Handlers for incident involved-unit reconciliation.

use axum::extract::{Path, State};
use axum::Json;
use cad_core::assignment::ReconcileReport;
use cad_core::error::CoreError;
use cad_core::settings::validate_max_assignments;
use cad_core::types::DbId;
use cad_core::unit::IncidentKind;
use cad_db::models::incident::Incident;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateInvolvedUnits {
    /// The complete desired set of involved unit ids.
    pub unit_ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct InvolvedUnitsResponse {
    pub incident: Incident,
    pub report: ReconcileReport,
}

async fn ensure_incident_exists(
    state: &AppState,
    kind: IncidentKind,
    id: DbId,
) -> AppResult<Incident> {
    state
        .store
        .find_incident(kind, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Incident",
            id,
        }))
}

// ---------------------------------------------------------------------------
// GET /incidents/{kind}/{id}
// ---------------------------------------------------------------------------

pub async fn get_incident(
    State(state): State<AppState>,
    Path((kind, id)): Path<(IncidentKind, DbId)>,
) -> AppResult<Json<DataResponse<Incident>>> {
    let incident = ensure_incident_exists(&state, kind, id).await?;
    Ok(Json(DataResponse { data: incident }))
}

// ---------------------------------------------------------------------------
// PUT /incidents/{kind}/{id}
// ---------------------------------------------------------------------------

/// Replace the incident's involved units with `unit_ids`.
///
/// Units that cannot be attached or detached are listed in the report;
/// they never fail the request.
pub async fn update_involved_units(
    State(state): State<AppState>,
    Path((kind, id)): Path<(IncidentKind, DbId)>,
    Json(input): Json<UpdateInvolvedUnits>,
) -> AppResult<Json<DataResponse<InvolvedUnitsResponse>>> {
    let settings = state.store.settings().await?;
    let max = validate_max_assignments(settings.max_assignments_to_incidents)?;
    let incident = ensure_incident_exists(&state, kind, id).await?;

    let report = state
        .engine
        .synchronizer
        .reconcile(&incident, &input.unit_ids, max)
        .await;
    let incident = ensure_incident_exists(&state, kind, id).await?;

    tracing::info!(
        incident_id = id,
        %kind,
        connected = report.connected().count(),
        disconnected = report.disconnected().count(),
        skipped = report.skipped().count(),
        "Involved units updated"
    );

    Ok(Json(DataResponse {
        data: InvolvedUnitsResponse { incident, report },
    }))
}
