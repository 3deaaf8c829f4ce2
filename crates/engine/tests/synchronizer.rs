mod common;

use assert_matches::assert_matches;
use cad_core::assignment::{SkipReason, UnitOutcome};
use cad_core::unit::{IncidentKind, UnitKind};
use cad_db::store::memory::OFF_DUTY_STATUS_ID;
use cad_db::DispatchStore;
use cad_events::DispatchEvent;
use chrono::{Duration, Utc};

use common::harness;

#[tokio::test]
async fn connecting_an_idle_unit_points_it_at_the_incident() {
    let h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let incident = h.incident(IncidentKind::Leo).await;

    let report = h.reconcile(&incident, &[officer.id], 1).await;

    assert_matches!(
        report.outcome_for(officer.id),
        Some(UnitOutcome::Connected { kind: UnitKind::Officer, active_incident_id: Some(id), .. })
            if *id == incident.id
    );
    assert_eq!(h.unit(&officer).await.active_incident_id, Some(incident.id));
    assert_eq!(h.reload(&incident).await.units_involved.len(), 1);
}

#[tokio::test]
async fn connecting_a_busy_unit_keeps_its_pointer() {
    let h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let first = h.incident(IncidentKind::Leo).await;
    let second = h.incident(IncidentKind::Leo).await;

    h.reconcile(&first, &[officer.id], 2).await;
    let report = h.reconcile(&second, &[officer.id], 2).await;

    assert_eq!(report.connected().collect::<Vec<_>>(), vec![officer.id]);
    assert_eq!(h.unit(&officer).await.active_incident_id, Some(first.id));
    assert_eq!(h.store.involvements_for(officer.unit_ref()).await.len(), 2);
}

#[tokio::test]
async fn unit_at_cap_is_skipped_with_counts() {
    let h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let first = h.incident(IncidentKind::Leo).await;
    let second = h.incident(IncidentKind::Leo).await;

    h.reconcile(&first, &[officer.id], 1).await;
    let report = h.reconcile(&second, &[officer.id], 1).await;

    assert_matches!(
        report.outcome_for(officer.id),
        Some(UnitOutcome::Skipped {
            reason: SkipReason::CapacityExceeded { active: 1, max: 1 },
            ..
        })
    );
    assert!(h.reload(&second).await.units_involved.is_empty());
    assert_eq!(h.unit(&officer).await.active_incident_id, Some(first.id));
}

#[tokio::test]
async fn inactive_incidents_do_not_count_toward_the_cap() {
    let h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let closed = h.incident(IncidentKind::Leo).await;
    let fresh = h.incident(IncidentKind::Leo).await;

    h.reconcile(&closed, &[officer.id], 1).await;
    h.store.set_incident_active(IncidentKind::Leo, closed.id, false).await;
    let report = h.reconcile(&fresh, &[officer.id], 1).await;

    assert_eq!(report.connected().collect::<Vec<_>>(), vec![officer.id]);
}

#[tokio::test]
async fn replaying_the_same_set_is_a_noop() {
    let mut h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let combined = h.on_duty(UnitKind::CombinedLeo, "1-A-1/2").await;
    let incident = h.incident(IncidentKind::Leo).await;

    h.reconcile(&incident, &[officer.id, combined.id], 1).await;
    let before = h.reload(&incident).await;
    h.drain();

    let report = h.reconcile(&incident, &[combined.id, officer.id], 1).await;

    assert!(report.is_noop());
    assert_eq!(h.reload(&incident).await, before);
    assert_eq!(h.unit(&officer).await.active_incident_id, Some(incident.id));
}

#[tokio::test]
async fn dropping_the_only_involvement_clears_the_pointer() {
    let h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let incident = h.incident(IncidentKind::Leo).await;

    h.reconcile(&incident, &[officer.id], 1).await;
    let report = h.reconcile(&incident, &[], 1).await;

    assert_matches!(
        report.outcome_for(officer.id),
        Some(UnitOutcome::Disconnected { active_incident_id: None, .. })
    );
    assert_eq!(h.unit(&officer).await.active_incident_id, None);
    assert!(h.store.involvements_for(officer.unit_ref()).await.is_empty());
}

#[tokio::test]
async fn dropping_the_active_incident_resumes_the_earliest_remaining() {
    let h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let older = h.incident(IncidentKind::Leo).await;
    let newer = h.incident(IncidentKind::Leo).await;
    let active = h.incident(IncidentKind::Leo).await;
    let now = Utc::now();
    let unit = officer.unit_ref();

    h.store
        .insert_involvement_at(IncidentKind::Leo, newer.id, unit, now - Duration::minutes(5))
        .await;
    h.store
        .insert_involvement_at(IncidentKind::Leo, older.id, unit, now - Duration::minutes(20))
        .await;
    h.store
        .insert_involvement_at(IncidentKind::Leo, active.id, unit, now - Duration::minutes(1))
        .await;
    h.store.set_active_incident(unit, Some(active.id)).await.unwrap();

    h.reconcile(&active, &[], 5).await;

    assert_eq!(h.unit(&officer).await.active_incident_id, Some(older.id));
}

#[tokio::test]
async fn off_duty_and_foreign_units_are_unavailable() {
    let h = harness();
    let off = h
        .store
        .insert_unit(UnitKind::Officer, "1-A-9", Some(OFF_DUTY_STATUS_ID))
        .await;
    let no_status = h.store.insert_unit(UnitKind::Officer, "1-A-8", None).await;
    let deputy = h.on_duty(UnitKind::EmsFdDeputy, "M-1").await;
    let incident = h.incident(IncidentKind::Leo).await;

    let report = h
        .reconcile(&incident, &[off.id, no_status.id, deputy.id, 4242], 3)
        .await;

    assert_eq!(report.skipped().count(), 4);
    assert!(report
        .skipped()
        .all(|(_, reason)| *reason == SkipReason::UnitUnavailable));
    assert!(h.reload(&incident).await.units_involved.is_empty());
}

#[tokio::test]
async fn ems_units_never_get_a_pointer() {
    let h = harness();
    let deputy = h.on_duty(UnitKind::EmsFdDeputy, "M-1").await;
    let combined = h.on_duty(UnitKind::CombinedEmsFd, "M-1/2").await;
    let incident = h.incident(IncidentKind::EmsFd).await;

    let report = h.reconcile(&incident, &[deputy.id, combined.id], 1).await;

    assert_eq!(report.connected().count(), 2);
    assert_matches!(
        report.outcome_for(deputy.id),
        Some(UnitOutcome::Connected { kind: UnitKind::EmsFdDeputy, active_incident_id: None, .. })
    );
    assert_eq!(h.unit(&deputy).await.active_incident_id, None);

    let report = h.reconcile(&incident, &[combined.id], 1).await;
    assert_matches!(
        report.outcome_for(deputy.id),
        Some(UnitOutcome::Disconnected { kind: UnitKind::EmsFdDeputy, .. })
    );
}

#[tokio::test]
async fn one_failing_unit_does_not_stop_the_others() {
    let h = harness();
    let good = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let bad = h.on_duty(UnitKind::Officer, "1-A-2").await;
    let incident = h.incident(IncidentKind::Leo).await;
    h.store.fail_operation_for("create_involvement", bad.id).await;

    let report = h.reconcile(&incident, &[good.id, bad.id], 1).await;

    assert_eq!(report.connected().collect::<Vec<_>>(), vec![good.id]);
    assert_matches!(
        report.outcome_for(bad.id),
        Some(UnitOutcome::Skipped { reason: SkipReason::StoreFailure { .. }, .. })
    );
}

#[tokio::test]
async fn failed_connect_leaves_the_pointer_alone() {
    let h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let incident = h.incident(IncidentKind::Leo).await;
    h.store.fail_operation_for("create_involvement", officer.id).await;

    let report = h.reconcile(&incident, &[officer.id], 1).await;

    assert_matches!(
        report.outcome_for(officer.id),
        Some(UnitOutcome::Skipped { reason: SkipReason::StoreFailure { .. }, .. })
    );
    assert_eq!(h.unit(&officer).await.active_incident_id, None);
    assert!(h.reload(&incident).await.units_involved.is_empty());
}

#[tokio::test]
async fn racing_insert_rolls_back_the_pointer() {
    let h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let incident = h.incident(IncidentKind::Leo).await;
    let stale_view = h.reload(&incident).await;
    h.store
        .insert_involvement_at(IncidentKind::Leo, incident.id, officer.unit_ref(), Utc::now())
        .await;

    let report = h
        .engine
        .synchronizer
        .reconcile(&stale_view, &[officer.id], 2)
        .await;

    assert_matches!(
        report.outcome_for(officer.id),
        Some(UnitOutcome::Skipped { reason: SkipReason::StoreFailure { .. }, .. })
    );
    assert_eq!(h.unit(&officer).await.active_incident_id, None);
    assert_eq!(h.reload(&incident).await.units_involved.len(), 1);
}

#[tokio::test]
async fn failed_disconnect_keeps_the_row_and_pointer() {
    let h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let incident = h.incident(IncidentKind::Leo).await;
    h.reconcile(&incident, &[officer.id], 1).await;
    h.store.fail_operation_for("set_active_incident", officer.id).await;

    let report = h.reconcile(&incident, &[], 1).await;

    assert_matches!(
        report.outcome_for(officer.id),
        Some(UnitOutcome::Skipped { reason: SkipReason::StoreFailure { .. }, .. })
    );
    assert_eq!(h.unit(&officer).await.active_incident_id, Some(incident.id));
    assert_eq!(h.reload(&incident).await.units_involved.len(), 1);
}

#[tokio::test]
async fn vanished_involvement_is_reported_missing() {
    let h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let incident = h.incident(IncidentKind::Leo).await;
    h.reconcile(&incident, &[officer.id], 1).await;

    let stale_view = h.reload(&incident).await;
    h.engine.synchronizer.reconcile(&stale_view, &[], 1).await;
    let report = h.engine.synchronizer.reconcile(&stale_view, &[], 1).await;

    assert_matches!(
        report.outcome_for(officer.id),
        Some(UnitOutcome::Skipped { reason: SkipReason::InvolvementMissing, .. })
    );
}

#[tokio::test]
async fn reconcile_emits_statuses_then_the_refreshed_incident() {
    let mut h = harness();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let other = h.on_duty(UnitKind::Officer, "1-A-2").await;
    let incident = h.incident(IncidentKind::Leo).await;

    h.reconcile(&incident, &[officer.id, other.id], 1).await;
    let events = h.drain();

    assert_eq!(events.len(), 3);
    assert_eq!(events[0], DispatchEvent::OfficerStatusUpdated);
    assert_eq!(events[1], DispatchEvent::DeputyStatusUpdated);
    assert_matches!(
        &events[2],
        DispatchEvent::ActiveIncidentUpdated(i) if i.id == incident.id && i.units_involved.len() == 2
    );
}
