//! [`DispatchStore`] backed by PostgreSQL through the sqlx repositories.

use async_trait::async_trait;
use cad_core::incident_stack::InvolvementCandidate;
use cad_core::types::{DbId, Timestamp};
use cad_core::unit::{IncidentKind, UnitFilter, UnitKind, UnitRef};
use sqlx::PgPool;

use crate::error::StoreResult;
use crate::models::bolo::{Bolo, CreateBolo, UpdateBolo};
use crate::models::call::Call911;
use crate::models::incident::{Incident, InvolvedUnit};
use crate::models::officer_log::OfficerLog;
use crate::models::settings::CadSettings;
use crate::models::status::StatusValue;
use crate::models::unit::Unit;
use crate::repositories::{
    BoloRepo, CallRepo, DispatchChatRepo, IncidentRepo, InvolvedUnitRepo, OfficerLogRepo,
    SettingsRepo, StatusRepo, UnitRepo,
};
use crate::store::{BatchResult, BatchWrite, DispatchStore};

/// Postgres-backed store. Cheap to clone (the pool is reference counted).
#[derive(Clone)]
pub struct PgDispatchStore {
    pool: PgPool,
}

impl PgDispatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DispatchStore for PgDispatchStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn settings(&self) -> StoreResult<CadSettings> {
        Ok(SettingsRepo::get(&self.pool).await?)
    }

    async fn find_status(&self, id: DbId) -> StoreResult<Option<StatusValue>> {
        Ok(StatusRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_unit(
        &self,
        kind: UnitKind,
        id: DbId,
        filter: UnitFilter,
    ) -> StoreResult<Option<Unit>> {
        Ok(UnitRepo::find(&self.pool, kind, id, filter).await?)
    }

    async fn list_units(&self, kind: UnitKind) -> StoreResult<Vec<Unit>> {
        Ok(UnitRepo::list(&self.pool, kind).await?)
    }

    async fn list_stale_units(&self, kind: UnitKind, cutoff: Timestamp) -> StoreResult<Vec<Unit>> {
        Ok(UnitRepo::list_stale(&self.pool, kind, cutoff).await?)
    }

    async fn set_unit_status(&self, unit: UnitRef, status_id: Option<DbId>) -> StoreResult<bool> {
        Ok(UnitRepo::set_status(&self.pool, unit, status_id).await?)
    }

    async fn set_active_incident(
        &self,
        unit: UnitRef,
        incident_id: Option<DbId>,
    ) -> StoreResult<bool> {
        Ok(UnitRepo::set_active_incident(&self.pool, unit, incident_id).await?)
    }

    async fn clear_unit_pointers(&self, kind: UnitKind, ids: &[DbId]) -> StoreResult<u64> {
        Ok(UnitRepo::clear_pointers(&self.pool, kind, ids).await?)
    }

    async fn delete_stale_units(
        &self,
        kind: UnitKind,
        cutoff: Timestamp,
    ) -> StoreResult<Vec<DbId>> {
        Ok(UnitRepo::delete_stale(&self.pool, kind, cutoff).await?)
    }

    async fn find_open_officer_log(&self, unit: UnitRef) -> StoreResult<Option<OfficerLog>> {
        Ok(OfficerLogRepo::find_open(&self.pool, unit).await?)
    }

    async fn open_officer_log(&self, unit: UnitRef, user_id: DbId) -> StoreResult<OfficerLog> {
        Ok(OfficerLogRepo::open(&self.pool, unit, user_id).await?)
    }

    async fn close_open_officer_log(&self, unit: UnitRef) -> StoreResult<Option<OfficerLog>> {
        Ok(OfficerLogRepo::close_open(&self.pool, unit).await?)
    }

    async fn find_incident(&self, kind: IncidentKind, id: DbId) -> StoreResult<Option<Incident>> {
        Ok(IncidentRepo::find_by_id(&self.pool, kind, id).await?)
    }

    async fn list_unit_involvements(
        &self,
        unit: UnitRef,
    ) -> StoreResult<Vec<InvolvementCandidate>> {
        let rows = InvolvedUnitRepo::list_for_unit(&self.pool, unit).await?;
        Ok(rows
            .into_iter()
            .map(|r| InvolvementCandidate {
                involvement_id: r.id,
                incident_id: r.incident_id,
                incident_is_active: r.incident_is_active,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn count_active_involvements(
        &self,
        unit: UnitRef,
        kind: IncidentKind,
    ) -> StoreResult<u32> {
        let count = InvolvedUnitRepo::count_active_for_unit(&self.pool, unit, kind).await?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn create_involvement(
        &self,
        kind: IncidentKind,
        incident_id: DbId,
        unit: UnitRef,
    ) -> StoreResult<InvolvedUnit> {
        Ok(InvolvedUnitRepo::create(&self.pool, kind, incident_id, unit).await?)
    }

    async fn delete_involvement(&self, id: DbId) -> StoreResult<Option<InvolvedUnit>> {
        Ok(InvolvedUnitRepo::delete(&self.pool, id).await?)
    }

    async fn execute_batch(&self, writes: &[BatchWrite]) -> StoreResult<Vec<BatchResult>> {
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(writes.len());
        for write in writes {
            let result = match *write {
                BatchWrite::SetActiveIncident { unit, incident_id } => BatchResult::ActiveIncidentSet(
                    UnitRepo::set_active_incident_in(&mut tx, unit, incident_id).await?,
                ),
                BatchWrite::CreateInvolvement {
                    kind,
                    incident_id,
                    unit,
                } => BatchResult::InvolvementCreated(
                    InvolvedUnitRepo::create_in(&mut tx, kind, incident_id, unit).await?,
                ),
                BatchWrite::DeleteInvolvement { id } => {
                    BatchResult::InvolvementDeleted(InvolvedUnitRepo::delete_in(&mut tx, id).await?)
                }
            };
            results.push(result);
        }
        tx.commit().await?;
        Ok(results)
    }

    async fn list_calls_for_unit(&self, unit: UnitRef) -> StoreResult<Vec<Call911>> {
        Ok(CallRepo::list_for_unit(&self.pool, unit).await?)
    }

    async fn delete_assigned_units(&self, unit: UnitRef) -> StoreResult<u64> {
        Ok(CallRepo::delete_assignments_for_unit(&self.pool, unit).await?)
    }

    async fn list_bolos(&self) -> StoreResult<Vec<Bolo>> {
        Ok(BoloRepo::list(&self.pool).await?)
    }

    async fn create_bolo(&self, input: &CreateBolo) -> StoreResult<Bolo> {
        Ok(BoloRepo::create(&self.pool, input).await?)
    }

    async fn update_bolo(&self, id: DbId, input: &UpdateBolo) -> StoreResult<Option<Bolo>> {
        Ok(BoloRepo::update(&self.pool, id, input).await?)
    }

    async fn delete_bolo(&self, id: DbId) -> StoreResult<bool> {
        Ok(BoloRepo::delete(&self.pool, id).await?)
    }

    async fn delete_bolos_older_than(&self, cutoff: Timestamp) -> StoreResult<Vec<DbId>> {
        Ok(BoloRepo::delete_older_than(&self.pool, cutoff).await?)
    }

    async fn delete_dispatch_chats(&self, units: &[UnitRef]) -> StoreResult<u64> {
        Ok(DispatchChatRepo::delete_for_units(&self.pool, units).await?)
    }
}
