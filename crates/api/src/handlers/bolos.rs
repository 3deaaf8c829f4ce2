//! Handlers for BOLO CRUD. Every write is announced on the event bus.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cad_core::bolo::{validate_bolo_fields, validate_bolo_type};
use cad_core::error::CoreError;
use cad_core::types::DbId;
use cad_db::models::bolo::{Bolo, CreateBolo, UpdateBolo};
use cad_engine::InactivityReaper;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn bolo_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Bolo", id })
}

// ---------------------------------------------------------------------------
// GET /bolos
// ---------------------------------------------------------------------------

/// List BOLOs, newest first, after expiring stale ones.
pub async fn list_bolos(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Bolo>>>> {
    let settings = state.store.settings().await?;
    if let Some(cutoff) =
        InactivityReaper::cutoff_from(chrono::Utc::now(), settings.bolo_inactivity_timeout_mins)
    {
        if let Err(e) = state.engine.reaper.expire_bolos(cutoff).await {
            tracing::warn!(%cutoff, error = %e, "BOLO expiry failed");
        }
    }

    let bolos = state.store.list_bolos().await?;
    Ok(Json(DataResponse { data: bolos }))
}

// ---------------------------------------------------------------------------
// POST /bolos
// ---------------------------------------------------------------------------

pub async fn create_bolo(
    State(state): State<AppState>,
    Json(input): Json<CreateBolo>,
) -> AppResult<impl IntoResponse> {
    validate_bolo_type(&input.bolo_type)?;
    validate_bolo_fields(
        input.description.as_deref(),
        input.plate.as_deref(),
        input.name.as_deref(),
    )?;

    let bolo = state.store.create_bolo(&input).await?;
    tracing::info!(bolo_id = bolo.id, bolo_type = %bolo.bolo_type, "BOLO created");
    state.event_bus.emit_create_bolo(bolo.clone());

    Ok((StatusCode::CREATED, Json(DataResponse { data: bolo })))
}

// ---------------------------------------------------------------------------
// PUT /bolos/{id}
// ---------------------------------------------------------------------------

pub async fn update_bolo(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateBolo>,
) -> AppResult<Json<DataResponse<Bolo>>> {
    if let Some(ref bolo_type) = input.bolo_type {
        validate_bolo_type(bolo_type)?;
    }

    let bolo = state
        .store
        .update_bolo(id, &input)
        .await?
        .ok_or_else(|| bolo_not_found(id))?;
    state.event_bus.emit_update_bolo(bolo.clone());

    Ok(Json(DataResponse { data: bolo }))
}

// ---------------------------------------------------------------------------
// DELETE /bolos/{id}
// ---------------------------------------------------------------------------

pub async fn delete_bolo(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !state.store.delete_bolo(id).await? {
        return Err(bolo_not_found(id));
    }
    tracing::info!(bolo_id = id, "BOLO deleted");
    state.event_bus.emit_delete_bolo(id);

    Ok(StatusCode::NO_CONTENT)
}
