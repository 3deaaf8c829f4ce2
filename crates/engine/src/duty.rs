//! Duty lifecycle: officer logs and the off-duty cascade.
//!
//! Only `set_on_duty` and `set_off_duty` status codes cross the duty
//! boundary. Every other code just replaces the unit's status.

use std::sync::Arc;

use cad_core::status::DutyTransition;
use cad_core::types::DbId;
use cad_core::unit::{IncidentKind, UnitFilter, UnitRef};
use cad_db::models::officer_log::OfficerLog;
use cad_db::models::status::StatusValue;
use cad_db::models::unit::Unit;
use cad_db::{DispatchStore, StoreError, StoreResult};
use cad_events::EventBus;
use serde::Serialize;

/// A cleanup step of the off-duty cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OffDutyStep {
    /// Detach the unit from every 911 call it is assigned to.
    CallAssignments,
    /// Drop the unit from its active incident's broadcast copy.
    ActiveIncident,
    /// Null the unit's status.
    Status,
    /// Close the open officer log.
    OfficerLog,
}

/// What the off-duty cascade did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OffDutyReport {
    pub calls_updated: usize,
    pub closed_log: Option<OfficerLog>,
    pub failed_steps: Vec<OffDutyStep>,
}

impl OffDutyReport {
    pub fn is_clean(&self) -> bool {
        self.failed_steps.is_empty()
    }

    fn fail(&mut self, unit: UnitRef, step: OffDutyStep, error: &StoreError) {
        tracing::warn!(unit = %unit, ?step, error = %error, "Off-duty step failed");
        self.failed_steps.push(step);
    }
}

/// Result of applying a status code to a unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum DutyOutcome {
    /// Status replaced; `opened_log` is set when this started a shift.
    StatusSet { opened_log: Option<OfficerLog> },
    /// The unit went off duty.
    OffDuty(OffDutyReport),
}

#[derive(Clone)]
pub struct DutyController {
    store: Arc<dyn DispatchStore>,
    bus: Arc<EventBus>,
}

impl DutyController {
    pub fn new(store: Arc<dyn DispatchStore>, bus: Arc<EventBus>) -> Self {
        Self { store, bus }
    }

    /// Put `unit` in `status` and run the duty transition it implies.
    ///
    /// Emits the unit family's status event afterwards. A storage failure
    /// while writing a non-off-duty status is returned to the caller.
    pub async fn apply_status(&self, unit: &Unit, status: &StatusValue) -> StoreResult<DutyOutcome> {
        let outcome = match status.should_do.duty_transition() {
            Some(DutyTransition::OffDuty) => DutyOutcome::OffDuty(self.go_off_duty(unit).await),
            transition => {
                self.store
                    .set_unit_status(unit.unit_ref(), Some(status.id))
                    .await?;
                let opened_log = match transition {
                    Some(DutyTransition::OnDuty) => self.go_on_duty(unit).await?,
                    _ => None,
                };
                DutyOutcome::StatusSet { opened_log }
            }
        };

        tracing::info!(
            unit = %unit.unit_ref(),
            status = %status.value,
            should_do = %status.should_do,
            "Unit status applied"
        );
        self.emit_family_status(unit.unit_ref());
        Ok(outcome)
    }

    /// Open an officer log unless the unit is temporary or already has one.
    pub async fn go_on_duty(&self, unit: &Unit) -> StoreResult<Option<OfficerLog>> {
        let Some(user_id) = loggable_user(unit) else {
            return Ok(None);
        };
        let unit_ref = unit.unit_ref();
        if self.store.find_open_officer_log(unit_ref).await?.is_some() {
            return Ok(None);
        }
        let log = self.store.open_officer_log(unit_ref, user_id).await?;
        tracing::debug!(unit = %unit_ref, log_id = log.id, "Officer log opened");
        Ok(Some(log))
    }

    /// Run the off-duty cascade and emit the unit family's status event.
    pub async fn sign_off(&self, unit: &Unit) -> OffDutyReport {
        let report = self.go_off_duty(unit).await;
        self.emit_family_status(unit.unit_ref());
        report
    }

    /// The off-duty cascade.
    ///
    /// Call detachment, the active-incident broadcast and the status reset
    /// run concurrently and all settle before the officer log is closed.
    /// Failed steps are logged and listed in the report. Unit status events
    /// are left to the caller so batch callers can emit once.
    pub async fn go_off_duty(&self, unit: &Unit) -> OffDutyReport {
        let unit_ref = unit.unit_ref();
        let (calls, incident, status) = tokio::join!(
            self.detach_from_calls(unit_ref),
            self.broadcast_without_unit(unit_ref),
            self.store.set_unit_status(unit_ref, None),
        );

        let mut report = OffDutyReport::default();
        match calls {
            Ok(count) => report.calls_updated = count,
            Err(e) => report.fail(unit_ref, OffDutyStep::CallAssignments, &e),
        }
        if let Err(e) = incident {
            report.fail(unit_ref, OffDutyStep::ActiveIncident, &e);
        }
        if let Err(e) = status {
            report.fail(unit_ref, OffDutyStep::Status, &e);
        }

        if loggable_user(unit).is_some() {
            match self.store.close_open_officer_log(unit_ref).await {
                Ok(closed) => report.closed_log = closed,
                Err(e) => report.fail(unit_ref, OffDutyStep::OfficerLog, &e),
            }
        }

        tracing::info!(
            unit = %unit_ref,
            calls_updated = report.calls_updated,
            log_closed = report.closed_log.is_some(),
            failed = report.failed_steps.len(),
            "Unit went off duty"
        );
        report
    }

    async fn detach_from_calls(&self, unit: UnitRef) -> StoreResult<usize> {
        let calls = self.store.list_calls_for_unit(unit).await?;
        let count = calls.len();
        for mut call in calls {
            call.assigned_units.retain(|a| a.unit != unit);
            self.bus.emit_update_911_call(call);
        }
        self.store.delete_assigned_units(unit).await?;
        Ok(count)
    }

    /// Broadcast the unit's active incident without the unit in it.
    ///
    /// The involvement row and the unit's pointer stay as they are.
    async fn broadcast_without_unit(&self, unit: UnitRef) -> StoreResult<()> {
        if !unit.kind.tracks_active_incident() {
            return Ok(());
        }
        let active = self
            .store
            .find_unit(unit.kind, unit.id, UnitFilter::Any)
            .await?
            .and_then(|u| u.active_incident_id);
        let Some(incident_id) = active else {
            return Ok(());
        };
        if let Some(mut incident) = self.store.find_incident(IncidentKind::Leo, incident_id).await? {
            incident.units_involved.retain(|iu| iu.unit != unit);
            self.bus.emit_update_active_incident(incident);
        }
        Ok(())
    }

    fn emit_family_status(&self, unit: UnitRef) {
        match unit.kind.family() {
            IncidentKind::Leo => self.bus.emit_update_officer_status(),
            IncidentKind::EmsFd => self.bus.emit_update_deputy_status(),
        }
    }
}

/// Owning user of a unit that keeps officer logs.
fn loggable_user(unit: &Unit) -> Option<DbId> {
    if unit.kind.is_combined() {
        return None;
    }
    unit.user_id
}
