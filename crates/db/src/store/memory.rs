//! In-process [`DispatchStore`].
//!
//! Mirrors the Postgres schema closely enough for the engine's behavior to
//! be identical: unit ids come from one shared counter, `updated_at` is
//! bumped on every unit/BOLO update (the Postgres trigger does the same),
//! and the involvement uniqueness constraint is enforced.
//!
//! Besides the trait, the store exposes seeding and inspection helpers plus
//! fault injection ([`MemoryDispatchStore::fail_operation`]) so tests can
//! drive partial-failure paths.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use cad_core::incident_stack::InvolvementCandidate;
use cad_core::status::ShouldDo;
use cad_core::types::{DbId, Timestamp};
use cad_core::unit::{IncidentKind, UnitFilter, UnitKind, UnitRef};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::models::bolo::{Bolo, CreateBolo, UpdateBolo};
use crate::models::call::{AssignedUnit, Call911, CallRow};
use crate::models::dispatch_chat::DispatchChat;
use crate::models::incident::{Incident, IncidentRow, InvolvedUnit};
use crate::models::officer_log::OfficerLog;
use crate::models::settings::CadSettings;
use crate::models::status::StatusValue;
use crate::models::unit::{CreateUnit, Unit};
use crate::store::{BatchResult, BatchWrite, DispatchStore};

/// Seeded `10-8` status (`set_on_duty`).
pub const ON_DUTY_STATUS_ID: DbId = 1;
/// Seeded `10-7` status (`set_off_duty`).
pub const OFF_DUTY_STATUS_ID: DbId = 2;
/// Seeded `10-6` status (`set_status`).
pub const BUSY_STATUS_ID: DbId = 3;
/// Seeded `10-97` status (`set_assigned`).
pub const ASSIGNED_STATUS_ID: DbId = 4;

#[derive(Default)]
struct Tables {
    next_unit_id: DbId,
    next_row_id: DbId,
    settings: CadSettings,
    statuses: BTreeMap<DbId, StatusValue>,
    units: HashMap<UnitRef, Unit>,
    incidents: HashMap<(IncidentKind, DbId), IncidentRow>,
    involvements: BTreeMap<DbId, InvolvedUnit>,
    calls: BTreeMap<DbId, CallRow>,
    assigned_units: BTreeMap<DbId, AssignedUnit>,
    officer_logs: BTreeMap<DbId, OfficerLog>,
    chats: BTreeMap<DbId, DispatchChat>,
    bolos: BTreeMap<DbId, Bolo>,
}

impl Tables {
    fn next_unit_id(&mut self) -> DbId {
        self.next_unit_id += 1;
        self.next_unit_id
    }

    fn next_row_id(&mut self) -> DbId {
        self.next_row_id += 1;
        self.next_row_id
    }

    fn passes(&self, unit: &Unit, filter: UnitFilter) -> bool {
        match filter {
            UnitFilter::Any => true,
            UnitFilter::NotOffDuty => match unit.status_id {
                None => false,
                Some(status_id) => self
                    .statuses
                    .get(&status_id)
                    .map_or(true, |s| !s.should_do.is_off_duty()),
            },
        }
    }

    fn incident(&self, kind: IncidentKind, id: DbId) -> Option<Incident> {
        let row = self.incidents.get(&(kind, id))?.clone();
        let mut involved: Vec<InvolvedUnit> = self
            .involvements
            .values()
            .filter(|iu| iu.incident_kind == kind && iu.incident_id == id)
            .cloned()
            .collect();
        involved.sort_by_key(|iu| (iu.created_at, iu.id));
        Some(Incident::from_parts(kind, row, involved))
    }

    fn call(&self, row: &CallRow) -> Call911 {
        let mut units: Vec<AssignedUnit> = self
            .assigned_units
            .values()
            .filter(|a| a.call_id == row.id)
            .cloned()
            .collect();
        units.sort_by_key(|a| (a.created_at, a.id));
        Call911::from_parts(row.clone(), units)
    }

    fn touch_unit(&mut self, unit: UnitRef) -> Option<&mut Unit> {
        let row = self.units.get_mut(&unit)?;
        row.updated_at = Utc::now();
        Some(row)
    }

    fn set_active_incident(&mut self, unit: UnitRef, incident_id: Option<DbId>) -> bool {
        if !unit.kind.tracks_active_incident() {
            return false;
        }
        match self.touch_unit(unit) {
            Some(row) => {
                row.active_incident_id = incident_id;
                true
            }
            None => false,
        }
    }

    fn create_involvement(
        &mut self,
        kind: IncidentKind,
        incident_id: DbId,
        unit: UnitRef,
    ) -> StoreResult<InvolvedUnit> {
        let duplicate = self.involvements.values().any(|iu| {
            iu.incident_kind == kind && iu.incident_id == incident_id && iu.unit == unit
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "{unit} is already involved in {kind} incident {incident_id}"
            )));
        }
        let id = self.next_row_id();
        let row = InvolvedUnit {
            id,
            incident_id,
            incident_kind: kind,
            unit,
            created_at: Utc::now(),
        };
        self.involvements.insert(id, row.clone());
        Ok(row)
    }

    /// Unit a write touches, for fault injection.
    fn write_target(&self, write: &BatchWrite) -> Option<DbId> {
        match *write {
            BatchWrite::SetActiveIncident { unit, .. } => Some(unit.id),
            BatchWrite::CreateInvolvement { unit, .. } => Some(unit.id),
            BatchWrite::DeleteInvolvement { id } => self.involvements.get(&id).map(|iu| iu.unit.id),
        }
    }

    fn apply(&mut self, write: &BatchWrite) -> StoreResult<BatchResult> {
        Ok(match *write {
            BatchWrite::SetActiveIncident { unit, incident_id } => {
                BatchResult::ActiveIncidentSet(self.set_active_incident(unit, incident_id))
            }
            BatchWrite::CreateInvolvement {
                kind,
                incident_id,
                unit,
            } => BatchResult::InvolvementCreated(self.create_involvement(kind, incident_id, unit)?),
            BatchWrite::DeleteInvolvement { id } => {
                BatchResult::InvolvementDeleted(self.involvements.remove(&id))
            }
        })
    }
}

/// In-memory dispatch store.
pub struct MemoryDispatchStore {
    tables: Mutex<Tables>,
    failing: Mutex<HashSet<(String, Option<DbId>)>>,
}

impl Default for MemoryDispatchStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDispatchStore {
    /// A store seeded with the default status codes and settings.
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for (id, value, should_do) in [
            (ON_DUTY_STATUS_ID, "10-8", ShouldDo::SetOnDuty),
            (OFF_DUTY_STATUS_ID, "10-7", ShouldDo::SetOffDuty),
            (BUSY_STATUS_ID, "10-6", ShouldDo::SetStatus),
            (ASSIGNED_STATUS_ID, "10-97", ShouldDo::SetAssigned),
        ] {
            tables.statuses.insert(
                id,
                StatusValue {
                    id,
                    value: value.to_string(),
                    should_do,
                },
            );
        }
        tables.next_row_id = ASSIGNED_STATUS_ID;
        Self {
            tables: Mutex::new(tables),
            failing: Mutex::new(HashSet::new()),
        }
    }

    // ── Fault injection ──────────────────────────────────────────────────

    /// Make every call to the trait method named `op` fail.
    pub async fn fail_operation(&self, op: &str) {
        self.failing.lock().await.insert((op.to_string(), None));
    }

    /// Make `op` fail only when it targets unit `unit_id`.
    pub async fn fail_operation_for(&self, op: &str, unit_id: DbId) {
        self.failing
            .lock()
            .await
            .insert((op.to_string(), Some(unit_id)));
    }

    pub async fn clear_failures(&self) {
        self.failing.lock().await.clear();
    }

    async fn check(&self, op: &str, unit_id: Option<DbId>) -> StoreResult<()> {
        let failing = self.failing.lock().await;
        let hit = failing.contains(&(op.to_string(), None))
            || unit_id.is_some_and(|id| failing.contains(&(op.to_string(), Some(id))));
        if hit {
            return Err(StoreError::Unavailable(format!("injected failure in {op}")));
        }
        Ok(())
    }

    // ── Seeding ──────────────────────────────────────────────────────────

    pub async fn set_settings(&self, settings: CadSettings) {
        self.tables.lock().await.settings = settings;
    }

    pub async fn insert_status(&self, value: &str, should_do: ShouldDo) -> StatusValue {
        let mut t = self.tables.lock().await;
        let id = t.next_row_id();
        let status = StatusValue {
            id,
            value: value.to_string(),
            should_do,
        };
        t.statuses.insert(id, status.clone());
        status
    }

    pub async fn create_unit(&self, kind: UnitKind, input: &CreateUnit) -> Unit {
        let mut t = self.tables.lock().await;
        let id = t.next_unit_id();
        let now = Utc::now();
        let unit = Unit {
            id,
            kind,
            callsign: input.callsign.clone(),
            status_id: input.status_id,
            active_call_id: None,
            active_incident_id: None,
            user_id: input.user_id,
            created_at: now,
            updated_at: now,
        };
        t.units.insert(unit.unit_ref(), unit.clone());
        unit
    }

    /// Shorthand for [`create_unit`](Self::create_unit). Combined units get
    /// no owning user.
    pub async fn insert_unit(
        &self,
        kind: UnitKind,
        callsign: &str,
        status_id: Option<DbId>,
    ) -> Unit {
        let user_id = if kind.is_combined() { None } else { Some(1) };
        self.create_unit(
            kind,
            &CreateUnit {
                callsign: callsign.to_string(),
                user_id,
                status_id,
            },
        )
        .await
    }

    pub async fn set_unit_active_call(&self, unit: UnitRef, call_id: Option<DbId>) {
        if let Some(row) = self.tables.lock().await.touch_unit(unit) {
            row.active_call_id = call_id;
        }
    }

    /// Overwrite `updated_at` without any other change.
    pub async fn set_unit_updated_at(&self, unit: UnitRef, at: Timestamp) {
        if let Some(row) = self.tables.lock().await.units.get_mut(&unit) {
            row.updated_at = at;
        }
    }

    pub async fn insert_incident(&self, kind: IncidentKind, is_active: bool) -> Incident {
        let mut t = self.tables.lock().await;
        let id = t.next_row_id();
        let case_number = t.incidents.keys().filter(|(k, _)| *k == kind).count() as i32 + 1;
        let now = Utc::now();
        let row = IncidentRow {
            id,
            case_number,
            description: None,
            is_active,
            created_at: now,
            updated_at: now,
        };
        t.incidents.insert((kind, id), row.clone());
        Incident::from_parts(kind, row, Vec::new())
    }

    pub async fn set_incident_active(&self, kind: IncidentKind, id: DbId, is_active: bool) {
        if let Some(row) = self.tables.lock().await.incidents.get_mut(&(kind, id)) {
            row.is_active = is_active;
            row.updated_at = Utc::now();
        }
    }

    /// Insert an involvement row with an explicit creation time.
    pub async fn insert_involvement_at(
        &self,
        kind: IncidentKind,
        incident_id: DbId,
        unit: UnitRef,
        created_at: Timestamp,
    ) -> InvolvedUnit {
        let mut t = self.tables.lock().await;
        let id = t.next_row_id();
        let row = InvolvedUnit {
            id,
            incident_id,
            incident_kind: kind,
            unit,
            created_at,
        };
        t.involvements.insert(id, row.clone());
        row
    }

    pub async fn insert_call(&self, location: &str) -> DbId {
        let mut t = self.tables.lock().await;
        let id = t.next_row_id();
        let case_number = t.calls.len() as i32 + 1;
        let now = Utc::now();
        t.calls.insert(
            id,
            CallRow {
                id,
                case_number,
                location: location.to_string(),
                description: None,
                ended: false,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub async fn assign_unit_to_call(&self, call_id: DbId, unit: UnitRef) -> AssignedUnit {
        let mut t = self.tables.lock().await;
        let id = t.next_row_id();
        let row = AssignedUnit {
            id,
            call_id,
            unit,
            created_at: Utc::now(),
        };
        t.assigned_units.insert(id, row.clone());
        row
    }

    pub async fn insert_chat(&self, unit: UnitRef, message: &str) -> DispatchChat {
        let mut t = self.tables.lock().await;
        let id = t.next_row_id();
        let row = DispatchChat {
            id,
            unit,
            call_id: None,
            incident_id: None,
            message: message.to_string(),
            created_at: Utc::now(),
        };
        t.chats.insert(id, row.clone());
        row
    }

    /// Insert a BOLO whose `created_at`/`updated_at` are both `at`.
    pub async fn insert_bolo_at(&self, input: &CreateBolo, at: Timestamp) -> Bolo {
        let mut t = self.tables.lock().await;
        let id = t.next_row_id();
        let bolo = Bolo {
            id,
            bolo_type: input.bolo_type.clone(),
            description: input.description.clone(),
            plate: input.plate.clone(),
            name: input.name.clone(),
            created_at: at,
            updated_at: at,
        };
        t.bolos.insert(id, bolo.clone());
        bolo
    }

    // ── Inspection ───────────────────────────────────────────────────────

    /// Current row of `unit`, regardless of status.
    pub async fn unit(&self, unit: UnitRef) -> Option<Unit> {
        self.tables.lock().await.units.get(&unit).cloned()
    }

    pub async fn officer_logs(&self, unit: UnitRef) -> Vec<OfficerLog> {
        self.tables
            .lock()
            .await
            .officer_logs
            .values()
            .filter(|l| l.unit == unit)
            .cloned()
            .collect()
    }

    pub async fn involvements_for(&self, unit: UnitRef) -> Vec<InvolvedUnit> {
        self.tables
            .lock()
            .await
            .involvements
            .values()
            .filter(|iu| iu.unit == unit)
            .cloned()
            .collect()
    }

    pub async fn assigned_units_for(&self, unit: UnitRef) -> Vec<AssignedUnit> {
        self.tables
            .lock()
            .await
            .assigned_units
            .values()
            .filter(|a| a.unit == unit)
            .cloned()
            .collect()
    }

    pub async fn chats_for(&self, unit: UnitRef) -> Vec<DispatchChat> {
        self.tables
            .lock()
            .await
            .chats
            .values()
            .filter(|c| c.unit == unit)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DispatchStore for MemoryDispatchStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn settings(&self) -> StoreResult<CadSettings> {
        self.check("settings", None).await?;
        Ok(self.tables.lock().await.settings.clone())
    }

    async fn find_status(&self, id: DbId) -> StoreResult<Option<StatusValue>> {
        self.check("find_status", None).await?;
        Ok(self.tables.lock().await.statuses.get(&id).cloned())
    }

    async fn find_unit(
        &self,
        kind: UnitKind,
        id: DbId,
        filter: UnitFilter,
    ) -> StoreResult<Option<Unit>> {
        self.check("find_unit", Some(id)).await?;
        let t = self.tables.lock().await;
        Ok(t.units
            .get(&UnitRef::new(kind, id))
            .filter(|u| t.passes(u, filter))
            .cloned())
    }

    async fn list_units(&self, kind: UnitKind) -> StoreResult<Vec<Unit>> {
        self.check("list_units", None).await?;
        let t = self.tables.lock().await;
        let mut units: Vec<Unit> = t.units.values().filter(|u| u.kind == kind).cloned().collect();
        units.sort_by(|a, b| a.callsign.cmp(&b.callsign).then(a.id.cmp(&b.id)));
        Ok(units)
    }

    async fn list_stale_units(&self, kind: UnitKind, cutoff: Timestamp) -> StoreResult<Vec<Unit>> {
        self.check("list_stale_units", None).await?;
        let t = self.tables.lock().await;
        let mut units: Vec<Unit> = t
            .units
            .values()
            .filter(|u| {
                u.kind == kind && u.updated_at < cutoff && t.passes(u, UnitFilter::NotOffDuty)
            })
            .cloned()
            .collect();
        units.sort_by_key(|u| u.id);
        Ok(units)
    }

    async fn set_unit_status(&self, unit: UnitRef, status_id: Option<DbId>) -> StoreResult<bool> {
        self.check("set_unit_status", Some(unit.id)).await?;
        let mut t = self.tables.lock().await;
        Ok(match t.touch_unit(unit) {
            Some(row) => {
                row.status_id = status_id;
                true
            }
            None => false,
        })
    }

    async fn set_active_incident(
        &self,
        unit: UnitRef,
        incident_id: Option<DbId>,
    ) -> StoreResult<bool> {
        self.check("set_active_incident", Some(unit.id)).await?;
        Ok(self.tables.lock().await.set_active_incident(unit, incident_id))
    }

    async fn clear_unit_pointers(&self, kind: UnitKind, ids: &[DbId]) -> StoreResult<u64> {
        self.check("clear_unit_pointers", None).await?;
        let mut t = self.tables.lock().await;
        let mut cleared = 0;
        for id in ids {
            if let Some(row) = t.touch_unit(UnitRef::new(kind, *id)) {
                row.status_id = None;
                row.active_call_id = None;
                row.active_incident_id = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn delete_stale_units(
        &self,
        kind: UnitKind,
        cutoff: Timestamp,
    ) -> StoreResult<Vec<DbId>> {
        self.check("delete_stale_units", None).await?;
        let mut t = self.tables.lock().await;
        let mut ids: Vec<DbId> = t
            .units
            .values()
            .filter(|u| u.kind == kind && u.updated_at < cutoff)
            .map(|u| u.id)
            .collect();
        ids.sort_unstable();
        for id in &ids {
            t.units.remove(&UnitRef::new(kind, *id));
        }
        let removed = |unit: &UnitRef| unit.kind == kind && ids.contains(&unit.id);
        t.involvements.retain(|_, iu| !removed(&iu.unit));
        t.assigned_units.retain(|_, a| !removed(&a.unit));
        Ok(ids)
    }

    async fn find_open_officer_log(&self, unit: UnitRef) -> StoreResult<Option<OfficerLog>> {
        self.check("find_open_officer_log", Some(unit.id)).await?;
        Ok(self
            .tables
            .lock()
            .await
            .officer_logs
            .values()
            .find(|l| l.unit == unit && l.is_open())
            .cloned())
    }

    async fn open_officer_log(&self, unit: UnitRef, user_id: DbId) -> StoreResult<OfficerLog> {
        self.check("open_officer_log", Some(unit.id)).await?;
        let mut t = self.tables.lock().await;
        if t.officer_logs.values().any(|l| l.unit == unit && l.is_open()) {
            return Err(StoreError::Conflict(format!("{unit} already has an open officer log")));
        }
        let id = t.next_row_id();
        let log = OfficerLog {
            id,
            unit,
            user_id,
            started_at: Utc::now(),
            ended_at: None,
        };
        t.officer_logs.insert(id, log.clone());
        Ok(log)
    }

    async fn close_open_officer_log(&self, unit: UnitRef) -> StoreResult<Option<OfficerLog>> {
        self.check("close_open_officer_log", Some(unit.id)).await?;
        let mut t = self.tables.lock().await;
        Ok(t.officer_logs
            .values_mut()
            .find(|l| l.unit == unit && l.is_open())
            .map(|l| {
                l.ended_at = Some(Utc::now());
                l.clone()
            }))
    }

    async fn find_incident(&self, kind: IncidentKind, id: DbId) -> StoreResult<Option<Incident>> {
        self.check("find_incident", None).await?;
        Ok(self.tables.lock().await.incident(kind, id))
    }

    async fn list_unit_involvements(
        &self,
        unit: UnitRef,
    ) -> StoreResult<Vec<InvolvementCandidate>> {
        self.check("list_unit_involvements", Some(unit.id)).await?;
        let t = self.tables.lock().await;
        let family = unit.kind.family();
        let mut candidates: Vec<InvolvementCandidate> = t
            .involvements
            .values()
            .filter(|iu| iu.unit == unit && iu.incident_kind == family)
            .filter_map(|iu| {
                let incident = t.incidents.get(&(family, iu.incident_id))?;
                Some(InvolvementCandidate {
                    involvement_id: iu.id,
                    incident_id: iu.incident_id,
                    incident_is_active: incident.is_active,
                    created_at: iu.created_at,
                })
            })
            .collect();
        candidates.sort_by_key(|c| (c.created_at, c.involvement_id));
        Ok(candidates)
    }

    async fn count_active_involvements(
        &self,
        unit: UnitRef,
        kind: IncidentKind,
    ) -> StoreResult<u32> {
        self.check("count_active_involvements", Some(unit.id)).await?;
        let t = self.tables.lock().await;
        let count = t
            .involvements
            .values()
            .filter(|iu| iu.unit == unit && iu.incident_kind == kind)
            .filter(|iu| {
                t.incidents
                    .get(&(kind, iu.incident_id))
                    .is_some_and(|i| i.is_active)
            })
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn create_involvement(
        &self,
        kind: IncidentKind,
        incident_id: DbId,
        unit: UnitRef,
    ) -> StoreResult<InvolvedUnit> {
        self.check("create_involvement", Some(unit.id)).await?;
        self.tables
            .lock()
            .await
            .create_involvement(kind, incident_id, unit)
    }

    async fn delete_involvement(&self, id: DbId) -> StoreResult<Option<InvolvedUnit>> {
        let unit_id = self
            .tables
            .lock()
            .await
            .involvements
            .get(&id)
            .map(|iu| iu.unit.id);
        self.check("delete_involvement", unit_id).await?;
        Ok(self.tables.lock().await.involvements.remove(&id))
    }

    async fn execute_batch(&self, writes: &[BatchWrite]) -> StoreResult<Vec<BatchResult>> {
        self.check("execute_batch", None).await?;
        let targets: Vec<Option<DbId>> = {
            let t = self.tables.lock().await;
            writes.iter().map(|w| t.write_target(w)).collect()
        };
        for (write, unit_id) in writes.iter().zip(targets) {
            self.check(write.operation(), unit_id).await?;
        }

        let mut t = self.tables.lock().await;
        let units = t.units.clone();
        let involvements = t.involvements.clone();
        let mut results = Vec::with_capacity(writes.len());
        for write in writes {
            match t.apply(write) {
                Ok(result) => results.push(result),
                Err(e) => {
                    t.units = units;
                    t.involvements = involvements;
                    return Err(e);
                }
            }
        }
        Ok(results)
    }

    async fn list_calls_for_unit(&self, unit: UnitRef) -> StoreResult<Vec<Call911>> {
        self.check("list_calls_for_unit", Some(unit.id)).await?;
        let t = self.tables.lock().await;
        let call_ids: HashSet<DbId> = t
            .assigned_units
            .values()
            .filter(|a| a.unit == unit)
            .map(|a| a.call_id)
            .collect();
        Ok(t.calls
            .values()
            .filter(|c| call_ids.contains(&c.id))
            .map(|c| t.call(c))
            .collect())
    }

    async fn delete_assigned_units(&self, unit: UnitRef) -> StoreResult<u64> {
        self.check("delete_assigned_units", Some(unit.id)).await?;
        let mut t = self.tables.lock().await;
        let before = t.assigned_units.len();
        t.assigned_units.retain(|_, a| a.unit != unit);
        Ok((before - t.assigned_units.len()) as u64)
    }

    async fn list_bolos(&self) -> StoreResult<Vec<Bolo>> {
        self.check("list_bolos", None).await?;
        let mut bolos: Vec<Bolo> = self.tables.lock().await.bolos.values().cloned().collect();
        bolos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bolos)
    }

    async fn create_bolo(&self, input: &CreateBolo) -> StoreResult<Bolo> {
        self.check("create_bolo", None).await?;
        Ok(self.insert_bolo_at(input, Utc::now()).await)
    }

    async fn update_bolo(&self, id: DbId, input: &UpdateBolo) -> StoreResult<Option<Bolo>> {
        self.check("update_bolo", None).await?;
        let mut t = self.tables.lock().await;
        Ok(t.bolos.get_mut(&id).map(|bolo| {
            if let Some(bolo_type) = &input.bolo_type {
                bolo.bolo_type = bolo_type.clone();
            }
            if input.description.is_some() {
                bolo.description = input.description.clone();
            }
            if input.plate.is_some() {
                bolo.plate = input.plate.clone();
            }
            if input.name.is_some() {
                bolo.name = input.name.clone();
            }
            bolo.updated_at = Utc::now();
            bolo.clone()
        }))
    }

    async fn delete_bolo(&self, id: DbId) -> StoreResult<bool> {
        self.check("delete_bolo", None).await?;
        Ok(self.tables.lock().await.bolos.remove(&id).is_some())
    }

    async fn delete_bolos_older_than(&self, cutoff: Timestamp) -> StoreResult<Vec<DbId>> {
        self.check("delete_bolos_older_than", None).await?;
        let mut t = self.tables.lock().await;
        let ids: Vec<DbId> = t
            .bolos
            .values()
            .filter(|b| b.updated_at < cutoff)
            .map(|b| b.id)
            .collect();
        for id in &ids {
            t.bolos.remove(id);
        }
        Ok(ids)
    }

    async fn delete_dispatch_chats(&self, units: &[UnitRef]) -> StoreResult<u64> {
        self.check("delete_dispatch_chats", None).await?;
        let mut t = self.tables.lock().await;
        let before = t.chats.len();
        t.chats.retain(|_, c| !units.contains(&c.unit));
        Ok((before - t.chats.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    #[tokio::test]
    async fn unit_ids_are_unique_across_kinds() {
        let store = MemoryDispatchStore::new();
        let officer = store.insert_unit(UnitKind::Officer, "1-A-1", None).await;
        let deputy = store.insert_unit(UnitKind::EmsFdDeputy, "M-1", None).await;
        let combined = store.insert_unit(UnitKind::CombinedLeo, "1-A-1/2", None).await;

        assert_ne!(officer.id, deputy.id);
        assert_ne!(deputy.id, combined.id);
        assert!(combined.user_id.is_none());
    }

    #[tokio::test]
    async fn not_off_duty_filter_hides_null_and_off_duty_units() {
        let store = MemoryDispatchStore::new();
        let none = store.insert_unit(UnitKind::Officer, "A", None).await;
        let off = store.insert_unit(UnitKind::Officer, "B", Some(OFF_DUTY_STATUS_ID)).await;
        let busy = store.insert_unit(UnitKind::Officer, "C", Some(BUSY_STATUS_ID)).await;

        for (id, visible) in [(none.id, false), (off.id, false), (busy.id, true)] {
            let found = store
                .find_unit(UnitKind::Officer, id, UnitFilter::NotOffDuty)
                .await
                .unwrap();
            assert_eq!(found.is_some(), visible, "unit {id}");
        }
        let any = store.find_unit(UnitKind::Officer, none.id, UnitFilter::Any).await.unwrap();
        assert!(any.is_some());
    }

    #[tokio::test]
    async fn duplicate_involvement_is_a_conflict() {
        let store = MemoryDispatchStore::new();
        let unit = store.insert_unit(UnitKind::Officer, "A", Some(BUSY_STATUS_ID)).await;
        let incident = store.insert_incident(IncidentKind::Leo, true).await;

        store
            .create_involvement(IncidentKind::Leo, incident.id, unit.unit_ref())
            .await
            .unwrap();
        let second = store
            .create_involvement(IncidentKind::Leo, incident.id, unit.unit_ref())
            .await;
        assert_matches!(second, Err(StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn only_one_open_officer_log_per_unit() {
        let store = MemoryDispatchStore::new();
        let unit = UnitRef::new(UnitKind::Officer, 7);

        store.open_officer_log(unit, 1).await.unwrap();
        assert_matches!(store.open_officer_log(unit, 1).await, Err(StoreError::Conflict(_)));

        let closed = store.close_open_officer_log(unit).await.unwrap().unwrap();
        assert!(closed.ended_at.is_some());
        assert!(store.find_open_officer_log(unit).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn injected_failure_targets_one_unit() {
        let store = MemoryDispatchStore::new();
        store.fail_operation_for("set_unit_status", 2).await;

        let ok = store.set_unit_status(UnitRef::new(UnitKind::Officer, 1), None).await;
        let failed = store.set_unit_status(UnitRef::new(UnitKind::Officer, 2), None).await;
        assert_matches!(ok, Ok(false));
        assert_matches!(failed, Err(StoreError::Unavailable(_)));

        store.clear_failures().await;
        assert!(store.set_unit_status(UnitRef::new(UnitKind::Officer, 2), None).await.is_ok());
    }

    #[tokio::test]
    async fn failed_batch_keeps_nothing() {
        let store = MemoryDispatchStore::new();
        let unit = store.insert_unit(UnitKind::Officer, "A", Some(BUSY_STATUS_ID)).await;
        let incident = store.insert_incident(IncidentKind::Leo, true).await;
        store
            .create_involvement(IncidentKind::Leo, incident.id, unit.unit_ref())
            .await
            .unwrap();

        let result = store
            .execute_batch(&[
                BatchWrite::SetActiveIncident {
                    unit: unit.unit_ref(),
                    incident_id: Some(incident.id),
                },
                BatchWrite::CreateInvolvement {
                    kind: IncidentKind::Leo,
                    incident_id: incident.id,
                    unit: unit.unit_ref(),
                },
            ])
            .await;

        assert_matches!(result, Err(StoreError::Conflict(_)));
        let row = store.unit(unit.unit_ref()).await.unwrap();
        assert_eq!(row.active_incident_id, None);
        assert_eq!(row.updated_at, unit.updated_at);
        assert_eq!(store.involvements_for(unit.unit_ref()).await.len(), 1);
    }

    #[tokio::test]
    async fn batch_results_follow_write_order() {
        let store = MemoryDispatchStore::new();
        let unit = store.insert_unit(UnitKind::Officer, "A", Some(BUSY_STATUS_ID)).await;
        let incident = store.insert_incident(IncidentKind::Leo, true).await;

        let results = store
            .execute_batch(&[
                BatchWrite::SetActiveIncident {
                    unit: unit.unit_ref(),
                    incident_id: Some(incident.id),
                },
                BatchWrite::CreateInvolvement {
                    kind: IncidentKind::Leo,
                    incident_id: incident.id,
                    unit: unit.unit_ref(),
                },
                BatchWrite::DeleteInvolvement { id: 9999 },
            ])
            .await
            .unwrap();

        assert_eq!(results[0], BatchResult::ActiveIncidentSet(true));
        assert_matches!(&results[1], BatchResult::InvolvementCreated(iu) if iu.unit == unit.unit_ref());
        assert_eq!(results[2], BatchResult::InvolvementDeleted(None));
    }

    #[tokio::test]
    async fn deleted_stale_units_leave_no_join_rows() {
        let store = MemoryDispatchStore::new();
        let now = Utc::now();
        let combined = store.insert_unit(UnitKind::CombinedLeo, "1-A-1/2", Some(BUSY_STATUS_ID)).await;
        let officer = store.insert_unit(UnitKind::Officer, "1-A-3", Some(BUSY_STATUS_ID)).await;
        let incident = store.insert_incident(IncidentKind::Leo, true).await;
        let call_id = store.insert_call("Vinewood").await;
        for unit in [combined.unit_ref(), officer.unit_ref()] {
            store
                .create_involvement(IncidentKind::Leo, incident.id, unit)
                .await
                .unwrap();
            store.assign_unit_to_call(call_id, unit).await;
        }
        store
            .set_unit_updated_at(combined.unit_ref(), now - Duration::hours(2))
            .await;

        let deleted = store
            .delete_stale_units(UnitKind::CombinedLeo, now - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(deleted, vec![combined.id]);
        assert!(store.involvements_for(combined.unit_ref()).await.is_empty());
        assert!(store.assigned_units_for(combined.unit_ref()).await.is_empty());
        assert_eq!(store.involvements_for(officer.unit_ref()).await.len(), 1);
        assert_eq!(store.assigned_units_for(officer.unit_ref()).await.len(), 1);
    }

    #[tokio::test]
    async fn stale_bolos_are_deleted_by_updated_at() {
        let store = MemoryDispatchStore::new();
        let now = Utc::now();
        let input = CreateBolo {
            bolo_type: "vehicle".to_string(),
            description: None,
            plate: Some("ABC123".to_string()),
            name: None,
        };
        let old = store.insert_bolo_at(&input, now - Duration::minutes(90)).await;
        let fresh = store.insert_bolo_at(&input, now).await;

        let deleted = store
            .delete_bolos_older_than(now - Duration::minutes(60))
            .await
            .unwrap();
        assert_eq!(deleted, vec![old.id]);
        let remaining: Vec<DbId> = store.list_bolos().await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(remaining, vec![fresh.id]);
    }
}
