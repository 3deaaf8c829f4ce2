//! Handlers for unit listing, status changes and the off-duty toggle.

use axum::extract::{Path, State};
use axum::Json;
use cad_core::error::CoreError;
use cad_core::types::DbId;
use cad_core::unit::{UnitFilter, UnitKind};
use cad_db::models::status::StatusValue;
use cad_db::models::unit::Unit;
use cad_engine::{filter_inactive_units, DutyOutcome, InactivityReaper, OffDutyReport, ResolvedUnit};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct UnitStatusResponse {
    pub unit: Unit,
    pub status: StatusValue,
    pub outcome: DutyOutcome,
}

#[derive(Debug, Serialize)]
pub struct OffDutyResponse {
    pub unit: Unit,
    pub report: OffDutyReport,
}

/// Resolve a unit id in any table, or 404.
async fn ensure_unit_exists(state: &AppState, id: DbId) -> AppResult<ResolvedUnit> {
    state
        .engine
        .directory
        .resolve(id, UnitFilter::Any)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Unit", id }))
}

/// Re-read a unit after the engine has written to it.
async fn reload_unit(state: &AppState, resolved: &ResolvedUnit) -> AppResult<Unit> {
    state
        .store
        .find_unit(resolved.kind, resolved.unit.id, UnitFilter::Any)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Unit",
            id: resolved.unit.id,
        }))
}

// ---------------------------------------------------------------------------
// GET /units
// ---------------------------------------------------------------------------

/// List every unit. When an inactivity timeout is configured, stale units
/// are released first and the listing is filtered against the same cutoff.
pub async fn list_units(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Unit>>>> {
    let settings = state.store.settings().await?;
    let cutoff =
        InactivityReaper::cutoff_from(chrono::Utc::now(), settings.unit_inactivity_timeout_mins);

    if let Some(cutoff) = cutoff {
        state.engine.reaper.sweep(cutoff).await;
    }

    let (officers, deputies, combined_leo, combined_ems) = tokio::try_join!(
        state.store.list_units(UnitKind::Officer),
        state.store.list_units(UnitKind::EmsFdDeputy),
        state.store.list_units(UnitKind::CombinedLeo),
        state.store.list_units(UnitKind::CombinedEmsFd),
    )?;
    let units: Vec<Unit> = officers
        .into_iter()
        .chain(deputies)
        .chain(combined_leo)
        .chain(combined_ems)
        .collect();

    let units = match cutoff {
        Some(cutoff) => filter_inactive_units(units, cutoff),
        None => units,
    };
    Ok(Json(DataResponse { data: units }))
}

// ---------------------------------------------------------------------------
// GET /units/{id}
// ---------------------------------------------------------------------------

pub async fn get_unit(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Unit>>> {
    let resolved = ensure_unit_exists(&state, id).await?;
    Ok(Json(DataResponse {
        data: resolved.unit,
    }))
}

// ---------------------------------------------------------------------------
// PUT /units/{id}/status
// ---------------------------------------------------------------------------

/// Put a unit in a status code and run the duty transition it implies.
pub async fn set_unit_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetStatusRequest>,
) -> AppResult<Json<DataResponse<UnitStatusResponse>>> {
    let resolved = ensure_unit_exists(&state, id).await?;
    let status = state
        .store
        .find_status(input.status_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(format!(
                "Unknown status_id: {}",
                input.status_id
            )))
        })?;

    let outcome = state.engine.duty.apply_status(&resolved.unit, &status).await?;
    let unit = reload_unit(&state, &resolved).await?;

    Ok(Json(DataResponse {
        data: UnitStatusResponse {
            unit,
            status,
            outcome,
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /units/{id}/off-duty
// ---------------------------------------------------------------------------

/// Take a unit off duty. Step failures are reported in the body, not as an
/// error status.
pub async fn set_unit_off_duty(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OffDutyResponse>>> {
    let resolved = ensure_unit_exists(&state, id).await?;
    let report = state.engine.duty.sign_off(&resolved.unit).await;
    if !report.is_clean() {
        tracing::warn!(
            unit_id = id,
            failed_steps = report.failed_steps.len(),
            "Unit went off duty with failed steps"
        );
    }
    let unit = reload_unit(&state, &resolved).await?;

    Ok(Json(DataResponse {
        data: OffDutyResponse { unit, report },
    }))
}
