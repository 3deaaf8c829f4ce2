//! The storage port the dispatch engine is written against.
//!
//! [`DispatchStore`] covers exactly the reads and writes the engine and its
//! HTTP entry points perform. [`postgres::PgDispatchStore`] backs it with
//! the sqlx repositories; [`memory::MemoryDispatchStore`] keeps everything
//! in process for tests and local runs.
//!
//! No method takes a lock across calls: two engine operations touching the
//! same rows interleave and the last write wins. Writes that must not be
//! observed half-applied go through [`DispatchStore::execute_batch`].

use async_trait::async_trait;
use cad_core::incident_stack::InvolvementCandidate;
use cad_core::types::{DbId, Timestamp};
use cad_core::unit::{IncidentKind, UnitFilter, UnitKind, UnitRef};

use crate::error::StoreResult;
use crate::models::bolo::{Bolo, CreateBolo, UpdateBolo};
use crate::models::call::Call911;
use crate::models::incident::{Incident, InvolvedUnit};
use crate::models::officer_log::OfficerLog;
use crate::models::settings::CadSettings;
use crate::models::status::StatusValue;
use crate::models::unit::Unit;

pub mod batch;
pub mod memory;
pub mod postgres;

pub use batch::{BatchResult, BatchWrite};

#[async_trait]
pub trait DispatchStore: Send + Sync {
    /// Short backend name for logs and the health endpoint.
    fn backend_tag(&self) -> &'static str;

    // ── Settings & status codes ──────────────────────────────────────────

    async fn settings(&self) -> StoreResult<CadSettings>;

    async fn find_status(&self, id: DbId) -> StoreResult<Option<StatusValue>>;

    // ── Units ────────────────────────────────────────────────────────────

    async fn find_unit(
        &self,
        kind: UnitKind,
        id: DbId,
        filter: UnitFilter,
    ) -> StoreResult<Option<Unit>>;

    async fn list_units(&self, kind: UnitKind) -> StoreResult<Vec<Unit>>;

    /// On-duty units of `kind` with `updated_at < cutoff`.
    async fn list_stale_units(&self, kind: UnitKind, cutoff: Timestamp) -> StoreResult<Vec<Unit>>;

    async fn set_unit_status(&self, unit: UnitRef, status_id: Option<DbId>) -> StoreResult<bool>;

    /// No-op for kinds without an active-incident pointer.
    async fn set_active_incident(
        &self,
        unit: UnitRef,
        incident_id: Option<DbId>,
    ) -> StoreResult<bool>;

    /// Null status, active call and active incident on `ids` in one statement.
    async fn clear_unit_pointers(&self, kind: UnitKind, ids: &[DbId]) -> StoreResult<u64>;

    /// Hard-delete units of `kind` with `updated_at < cutoff`; returns their ids.
    ///
    /// The units' involvement and call-assignment rows go with them in the
    /// same transaction.
    async fn delete_stale_units(&self, kind: UnitKind, cutoff: Timestamp)
        -> StoreResult<Vec<DbId>>;

    // ── Officer logs ─────────────────────────────────────────────────────

    async fn find_open_officer_log(&self, unit: UnitRef) -> StoreResult<Option<OfficerLog>>;

    async fn open_officer_log(&self, unit: UnitRef, user_id: DbId) -> StoreResult<OfficerLog>;

    async fn close_open_officer_log(&self, unit: UnitRef) -> StoreResult<Option<OfficerLog>>;

    // ── Incidents ────────────────────────────────────────────────────────

    async fn find_incident(&self, kind: IncidentKind, id: DbId) -> StoreResult<Option<Incident>>;

    /// Every involvement of `unit` with its incident's `is_active` flag.
    async fn list_unit_involvements(&self, unit: UnitRef)
        -> StoreResult<Vec<InvolvementCandidate>>;

    /// Involvements of `unit` in `is_active = true` incidents of `kind`.
    async fn count_active_involvements(&self, unit: UnitRef, kind: IncidentKind)
        -> StoreResult<u32>;

    async fn create_involvement(
        &self,
        kind: IncidentKind,
        incident_id: DbId,
        unit: UnitRef,
    ) -> StoreResult<InvolvedUnit>;

    /// Returns the deleted row, or `None` if it was already gone.
    async fn delete_involvement(&self, id: DbId) -> StoreResult<Option<InvolvedUnit>>;

    /// Apply `writes` in order as one transaction. On error nothing is kept.
    async fn execute_batch(&self, writes: &[BatchWrite]) -> StoreResult<Vec<BatchResult>>;

    // ── Calls ────────────────────────────────────────────────────────────

    /// Calls that list `unit` among their assigned units.
    async fn list_calls_for_unit(&self, unit: UnitRef) -> StoreResult<Vec<Call911>>;

    async fn delete_assigned_units(&self, unit: UnitRef) -> StoreResult<u64>;

    // ── BOLOs ────────────────────────────────────────────────────────────

    async fn list_bolos(&self) -> StoreResult<Vec<Bolo>>;

    async fn create_bolo(&self, input: &CreateBolo) -> StoreResult<Bolo>;

    async fn update_bolo(&self, id: DbId, input: &UpdateBolo) -> StoreResult<Option<Bolo>>;

    async fn delete_bolo(&self, id: DbId) -> StoreResult<bool>;

    async fn delete_bolos_older_than(&self, cutoff: Timestamp) -> StoreResult<Vec<DbId>>;

    // ── Dispatch chat ────────────────────────────────────────────────────

    async fn delete_dispatch_chats(&self, units: &[UnitRef]) -> StoreResult<u64>;
}
