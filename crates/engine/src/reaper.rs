//! Lazy release of units and BOLOs nobody has touched for too long.
//!
//! There is no scheduler: read handlers call in here with a cutoff derived
//! from the tenant's timeout settings before they answer.

use std::sync::Arc;

use cad_core::settings::inactivity_cutoff;
use cad_core::types::{DbId, Timestamp};
use cad_core::unit::{UnitKind, UnitRef};
use cad_db::models::unit::Unit;
use cad_db::{DispatchStore, StoreResult};
use cad_events::EventBus;
use futures::future::join_all;
use serde::Serialize;

use crate::duty::DutyController;

/// What one sweep changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReaperReport {
    /// Officers and deputies sent through the off-duty cascade.
    pub released: Vec<UnitRef>,
    /// Of `released`, units whose cascade had at least one failed step.
    pub partially_released: Vec<UnitRef>,
    /// Combined units that were deleted along with their involvements,
    /// call assignments and chats.
    pub deleted_combined: Vec<UnitRef>,
    pub chats_deleted: u64,
}

impl ReaperReport {
    pub fn is_empty(&self) -> bool {
        self.released.is_empty() && self.deleted_combined.is_empty()
    }
}

#[derive(Clone)]
pub struct InactivityReaper {
    store: Arc<dyn DispatchStore>,
    bus: Arc<EventBus>,
    duty: DutyController,
}

impl InactivityReaper {
    pub fn new(store: Arc<dyn DispatchStore>, bus: Arc<EventBus>, duty: DutyController) -> Self {
        Self { store, bus, duty }
    }

    /// Cutoff for a timeout in minutes, or `None` when the timeout is unset.
    pub fn cutoff_from(now: Timestamp, timeout_mins: Option<i32>) -> Option<Timestamp> {
        inactivity_cutoff(now, timeout_mins)
    }

    /// Release every unit last updated before `cutoff`.
    ///
    /// Never fails: a sweep that cannot run is logged and reported as empty.
    pub async fn sweep(&self, cutoff: Timestamp) -> ReaperReport {
        match self.try_sweep(cutoff).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(%cutoff, error = %e, "Inactivity sweep failed");
                ReaperReport::default()
            }
        }
    }

    /// [`sweep`](Self::sweep) with storage errors surfaced.
    pub async fn try_sweep(&self, cutoff: Timestamp) -> StoreResult<ReaperReport> {
        let (officers, deputies) = tokio::try_join!(
            self.store.list_stale_units(UnitKind::Officer, cutoff),
            self.store.list_stale_units(UnitKind::EmsFdDeputy, cutoff),
        )?;

        let stale: Vec<&Unit> = officers.iter().chain(deputies.iter()).collect();
        let cascades = join_all(stale.iter().map(|unit| self.duty.go_off_duty(unit))).await;

        let mut report = ReaperReport::default();
        for (unit, cascade) in stale.iter().zip(&cascades) {
            report.released.push(unit.unit_ref());
            if !cascade.is_clean() {
                report.partially_released.push(unit.unit_ref());
            }
        }

        let (combined_leo, combined_ems) = tokio::try_join!(
            self.store.delete_stale_units(UnitKind::CombinedLeo, cutoff),
            self.store.delete_stale_units(UnitKind::CombinedEmsFd, cutoff),
        )?;
        report.deleted_combined.extend(
            combined_leo
                .into_iter()
                .map(|id| UnitRef::new(UnitKind::CombinedLeo, id))
                .chain(
                    combined_ems
                        .into_iter()
                        .map(|id| UnitRef::new(UnitKind::CombinedEmsFd, id)),
                ),
        );

        let officer_ids: Vec<DbId> = officers.iter().map(|u| u.id).collect();
        let deputy_ids: Vec<DbId> = deputies.iter().map(|u| u.id).collect();
        tokio::try_join!(
            self.store.clear_unit_pointers(UnitKind::Officer, &officer_ids),
            self.store.clear_unit_pointers(UnitKind::EmsFdDeputy, &deputy_ids),
        )?;
        let chat_owners: Vec<UnitRef> = report
            .released
            .iter()
            .chain(&report.deleted_combined)
            .copied()
            .collect();
        report.chats_deleted = self.store.delete_dispatch_chats(&chat_owners).await?;

        if !report.is_empty() {
            tracing::info!(
                %cutoff,
                released = report.released.len(),
                partially_released = report.partially_released.len(),
                deleted_combined = report.deleted_combined.len(),
                chats_deleted = report.chats_deleted,
                "Inactive units released"
            );
            self.bus.emit_update_unit_statuses();
        }
        Ok(report)
    }

    /// Delete BOLOs last updated before `cutoff`, announcing each deletion.
    pub async fn expire_bolos(&self, cutoff: Timestamp) -> StoreResult<Vec<DbId>> {
        let expired = self.store.delete_bolos_older_than(cutoff).await?;
        if !expired.is_empty() {
            tracing::info!(%cutoff, expired = expired.len(), "Stale BOLOs expired");
        }
        for id in &expired {
            self.bus.emit_delete_bolo(*id);
        }
        Ok(expired)
    }
}

/// Present units as they would look after a sweep at `cutoff`.
///
/// Stale units come back with status, active call and active incident
/// cleared. Nothing is written.
pub fn filter_inactive_units(units: Vec<Unit>, cutoff: Timestamp) -> Vec<Unit> {
    units
        .into_iter()
        .map(|mut unit| {
            if unit.updated_at < cutoff {
                unit.status_id = None;
                unit.active_call_id = None;
                unit.active_incident_id = None;
            }
            unit
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn unit(id: DbId, minutes_ago: i64) -> Unit {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Unit {
            id,
            kind: UnitKind::Officer,
            callsign: format!("1-A-{id}"),
            status_id: Some(3),
            active_call_id: Some(10),
            active_incident_id: Some(20),
            user_id: Some(1),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn stale_units_are_presented_cleared() {
        let cutoff = Utc::now() - Duration::minutes(30);
        let out = filter_inactive_units(vec![unit(1, 45), unit(2, 5)], cutoff);

        assert_eq!(out[0].status_id, None);
        assert_eq!(out[0].active_call_id, None);
        assert_eq!(out[0].active_incident_id, None);
        assert_eq!(out[1].status_id, Some(3));
        assert_eq!(out[1].active_incident_id, Some(20));
    }

    #[test]
    fn filtering_leaves_the_input_rows_alone() {
        let cutoff = Utc::now() - Duration::minutes(30);
        let original = vec![unit(1, 45)];
        let _ = filter_inactive_units(original.clone(), cutoff);
        assert_eq!(original[0].status_id, Some(3));
    }

    #[test]
    fn no_timeout_means_no_cutoff() {
        assert!(InactivityReaper::cutoff_from(Utc::now(), None).is_none());
        let now = Utc::now();
        assert_eq!(
            InactivityReaper::cutoff_from(now, Some(15)),
            Some(now - Duration::minutes(15))
        );
    }
}
