//! Diff-based reconciliation of an incident's involved units.
//!
//! The caller sends the full desired set of unit ids. Units present only in
//! the incident are disconnected, units present only in the desired set are
//! connected, everything else is left alone, so replaying the same request
//! is a no-op.
//!
//! Per-unit work runs concurrently without locks. Each unit's branch reads
//! what it needs, then commits its involvement row change and its pointer
//! update as one batch, so a unit never points at an incident that does not
//! list it.

use std::collections::HashSet;
use std::sync::Arc;

use cad_core::assignment::{ReconcileReport, SkipReason, UnitOutcome};
use cad_core::incident_stack::{next_active_incident, ActiveIncidentUpdate, AssignmentDirection};
use cad_core::types::DbId;
use cad_core::unit::UnitFilter;
use cad_db::models::incident::Incident;
use cad_db::{BatchResult, BatchWrite, DispatchStore, StoreResult};
use cad_events::EventBus;
use futures::future::join_all;

use crate::directory::UnitDirectory;

#[derive(Clone)]
pub struct InvolvedUnitSynchronizer {
    store: Arc<dyn DispatchStore>,
    bus: Arc<EventBus>,
    directory: UnitDirectory,
}

impl InvolvedUnitSynchronizer {
    pub fn new(store: Arc<dyn DispatchStore>, bus: Arc<EventBus>, directory: UnitDirectory) -> Self {
        Self {
            store,
            bus,
            directory,
        }
    }

    /// Make `incident`'s involved units equal `desired_unit_ids`.
    ///
    /// Never fails as a whole: units that could not be changed are reported
    /// as [`UnitOutcome::Skipped`]. Emits both unit-status events and the
    /// refreshed incident once, after every branch settled.
    pub async fn reconcile(
        &self,
        incident: &Incident,
        desired_unit_ids: &[DbId],
        max_assignments_to_incidents: u32,
    ) -> ReconcileReport {
        let current: HashSet<DbId> = incident.involved_unit_ids().collect();
        let desired: HashSet<DbId> = desired_unit_ids.iter().copied().collect();

        let mut to_disconnect: Vec<DbId> = current.difference(&desired).copied().collect();
        let mut to_connect: Vec<DbId> = desired.difference(&current).copied().collect();
        to_disconnect.sort_unstable();
        to_connect.sort_unstable();

        tracing::debug!(
            incident_id = incident.id,
            kind = %incident.kind,
            connect = to_connect.len(),
            disconnect = to_disconnect.len(),
            "Reconciling involved units"
        );

        let disconnects = join_all(to_disconnect.iter().map(|&unit_id| async move {
            self.disconnect(incident, unit_id)
                .await
                .unwrap_or_else(|e| store_failure(incident, unit_id, &e))
        }));
        let connects = join_all(to_connect.iter().map(|&unit_id| async move {
            self.connect(incident, unit_id, max_assignments_to_incidents)
                .await
                .unwrap_or_else(|e| store_failure(incident, unit_id, &e))
        }));
        let (mut outcomes, connected) = tokio::join!(disconnects, connects);
        outcomes.extend(connected);

        let report = ReconcileReport { outcomes };
        self.notify(incident).await;
        report
    }

    async fn disconnect(&self, incident: &Incident, unit_id: DbId) -> StoreResult<UnitOutcome> {
        let missing = UnitOutcome::Skipped {
            unit_id,
            reason: SkipReason::InvolvementMissing,
        };
        let Some(row) = incident.units_involved.iter().find(|iu| iu.unit.id == unit_id) else {
            return Ok(missing);
        };
        let unit = row.unit;

        let mut writes = vec![BatchWrite::DeleteInvolvement { id: row.id }];
        let mut active_incident_id = None;
        if unit.kind.tracks_active_incident() {
            let involvements = self.store.list_unit_involvements(unit).await?;
            if !involvements.iter().any(|c| c.involvement_id == row.id) {
                tracing::debug!(unit_id, incident_id = incident.id, "Involvement already gone");
                return Ok(missing);
            }
            let remaining: Vec<_> = involvements
                .into_iter()
                .filter(|c| c.involvement_id != row.id)
                .collect();
            let current = self
                .store
                .find_unit(unit.kind, unit.id, UnitFilter::Any)
                .await?
                .and_then(|u| u.active_incident_id);
            let update = next_active_incident(
                current,
                incident.id,
                AssignmentDirection::Unassign,
                false,
                &remaining,
            );
            active_incident_id = update.apply(current);
            if update != ActiveIncidentUpdate::Unchanged {
                writes.push(BatchWrite::SetActiveIncident {
                    unit,
                    incident_id: active_incident_id,
                });
            }
        }

        let results = self.store.execute_batch(&writes).await?;
        if matches!(results.first(), Some(BatchResult::InvolvementDeleted(None))) {
            tracing::debug!(unit_id, incident_id = incident.id, "Involvement already gone");
            return Ok(missing);
        }

        tracing::info!(
            unit = %unit,
            incident_id = incident.id,
            ?active_incident_id,
            "Unit disconnected from incident"
        );
        Ok(UnitOutcome::Disconnected {
            unit_id,
            kind: unit.kind,
            active_incident_id,
        })
    }

    async fn connect(
        &self,
        incident: &Incident,
        unit_id: DbId,
        max_assignments: u32,
    ) -> StoreResult<UnitOutcome> {
        let Some(resolved) = self
            .directory
            .resolve_in(incident.kind.unit_kinds(), unit_id, UnitFilter::NotOffDuty)
            .await?
        else {
            return Ok(UnitOutcome::Skipped {
                unit_id,
                reason: SkipReason::UnitUnavailable,
            });
        };
        let unit = resolved.unit.unit_ref();

        let active = self
            .store
            .count_active_involvements(unit, incident.kind)
            .await?;
        if active >= max_assignments {
            tracing::info!(
                unit = %unit,
                incident_id = incident.id,
                active,
                max = max_assignments,
                "Unit at assignment cap"
            );
            return Ok(UnitOutcome::Skipped {
                unit_id,
                reason: SkipReason::CapacityExceeded {
                    active,
                    max: max_assignments,
                },
            });
        }

        let mut writes = Vec::with_capacity(2);
        let mut active_incident_id = resolved.unit.active_incident_id;
        if resolved.kind.tracks_active_incident() {
            let update = next_active_incident(
                active_incident_id,
                incident.id,
                AssignmentDirection::Assign,
                false,
                &[],
            );
            if update != ActiveIncidentUpdate::Unchanged {
                active_incident_id = update.apply(active_incident_id);
                writes.push(BatchWrite::SetActiveIncident {
                    unit,
                    incident_id: active_incident_id,
                });
            }
        }
        writes.push(BatchWrite::CreateInvolvement {
            kind: incident.kind,
            incident_id: incident.id,
            unit,
        });
        self.store.execute_batch(&writes).await?;

        tracing::info!(
            unit = %unit,
            incident_id = incident.id,
            ?active_incident_id,
            "Unit connected to incident"
        );
        Ok(UnitOutcome::Connected {
            unit_id,
            kind: resolved.kind,
            active_incident_id,
        })
    }

    async fn notify(&self, incident: &Incident) {
        self.bus.emit_update_unit_statuses();
        match self.store.find_incident(incident.kind, incident.id).await {
            Ok(Some(fresh)) => self.bus.emit_update_active_incident(fresh),
            Ok(None) => {
                tracing::warn!(incident_id = incident.id, "Incident vanished during reconcile");
            }
            Err(e) => {
                tracing::warn!(
                    incident_id = incident.id,
                    error = %e,
                    "Failed to reload incident after reconcile"
                );
            }
        }
    }
}

fn store_failure(incident: &Incident, unit_id: DbId, error: &cad_db::StoreError) -> UnitOutcome {
    tracing::warn!(
        unit_id,
        incident_id = incident.id,
        error = %error,
        "Involved-unit change failed"
    );
    UnitOutcome::Skipped {
        unit_id,
        reason: SkipReason::StoreFailure {
            message: error.to_string(),
        },
    }
}
