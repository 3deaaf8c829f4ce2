mod common;

use cad_core::unit::{IncidentKind, UnitKind};
use cad_db::models::bolo::CreateBolo;
use cad_db::store::memory::OFF_DUTY_STATUS_ID;
use cad_events::DispatchEvent;
use chrono::{Duration, Utc};

use common::harness;

#[tokio::test]
async fn sweep_releases_stale_units_only() {
    let mut h = harness();
    let now = Utc::now();
    let cutoff = now - Duration::minutes(30);

    let stale_officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    let stale_deputy = h.on_duty(UnitKind::EmsFdDeputy, "M-1").await;
    let fresh_officer = h.on_duty(UnitKind::Officer, "1-A-2").await;
    let stale_combined = h.on_duty(UnitKind::CombinedLeo, "1-A-3/4").await;
    let fresh_combined = h.on_duty(UnitKind::CombinedEmsFd, "M-2/3").await;

    h.engine.duty.go_on_duty(&stale_officer).await.unwrap();
    let incident = h.incident(IncidentKind::Leo).await;
    h.reconcile(&incident, &[stale_officer.id], 1).await;
    let call_id = h.store.insert_call("Sandy Shores").await;
    h.store.set_unit_active_call(stale_officer.unit_ref(), Some(call_id)).await;
    h.store.insert_chat(stale_officer.unit_ref(), "en route").await;
    h.store.insert_chat(fresh_officer.unit_ref(), "10-4").await;

    for unit in [&stale_officer, &stale_deputy, &stale_combined] {
        h.store
            .set_unit_updated_at(unit.unit_ref(), now - Duration::minutes(45))
            .await;
    }
    h.drain();

    let report = h.engine.reaper.sweep(cutoff).await;

    assert_eq!(report.released.len(), 2);
    assert!(report.released.contains(&stale_officer.unit_ref()));
    assert!(report.released.contains(&stale_deputy.unit_ref()));
    assert_eq!(report.deleted_combined, vec![stale_combined.unit_ref()]);
    assert_eq!(report.chats_deleted, 1);

    let officer = h.unit(&stale_officer).await;
    assert_eq!(officer.status_id, None);
    assert_eq!(officer.active_call_id, None);
    assert_eq!(officer.active_incident_id, None);
    assert!(!h.store.officer_logs(stale_officer.unit_ref()).await[0].is_open());

    assert!(h.store.unit(stale_combined.unit_ref()).await.is_none());
    assert!(h.store.unit(fresh_combined.unit_ref()).await.is_some());
    assert!(h.unit(&fresh_officer).await.status_id.is_some());
    assert_eq!(h.store.chats_for(fresh_officer.unit_ref()).await.len(), 1);

    let statuses: Vec<_> = h
        .drain()
        .into_iter()
        .filter(|e| {
            matches!(
                e,
                DispatchEvent::OfficerStatusUpdated | DispatchEvent::DeputyStatusUpdated
            )
        })
        .collect();
    assert_eq!(
        statuses,
        vec![DispatchEvent::OfficerStatusUpdated, DispatchEvent::DeputyStatusUpdated]
    );
}

#[tokio::test]
async fn reaped_combined_units_are_detached_everywhere() {
    let h = harness();
    let now = Utc::now();
    let combined = h.on_duty(UnitKind::CombinedLeo, "1-A-1/2").await;
    let officer = h.on_duty(UnitKind::Officer, "1-A-3").await;
    let incident = h.incident(IncidentKind::Leo).await;
    h.reconcile(&incident, &[combined.id, officer.id], 1).await;
    let call_id = h.store.insert_call("Paleto Bay").await;
    h.store.assign_unit_to_call(call_id, combined.unit_ref()).await;
    h.store.insert_chat(combined.unit_ref(), "on scene").await;
    h.store
        .set_unit_updated_at(combined.unit_ref(), now - Duration::hours(2))
        .await;

    let report = h.engine.reaper.sweep(now - Duration::hours(1)).await;

    assert_eq!(report.deleted_combined, vec![combined.unit_ref()]);
    assert_eq!(report.chats_deleted, 1);
    let involved: Vec<_> = h.reload(&incident).await.involved_unit_ids().collect();
    assert_eq!(involved, vec![officer.id]);
    assert!(h.store.involvements_for(combined.unit_ref()).await.is_empty());
    assert!(h.store.assigned_units_for(combined.unit_ref()).await.is_empty());
    assert!(h.store.chats_for(combined.unit_ref()).await.is_empty());
}

#[tokio::test]
async fn off_duty_units_are_not_released_again() {
    let h = harness();
    let now = Utc::now();
    let off = h
        .store
        .insert_unit(UnitKind::Officer, "1-A-1", Some(OFF_DUTY_STATUS_ID))
        .await;
    h.store
        .set_unit_updated_at(off.unit_ref(), now - Duration::hours(3))
        .await;

    let report = h.engine.reaper.sweep(now - Duration::hours(1)).await;

    assert!(report.is_empty());
    assert_eq!(h.unit(&off).await.status_id, Some(OFF_DUTY_STATUS_ID));
}

#[tokio::test]
async fn quiet_sweep_emits_nothing() {
    let mut h = harness();
    h.on_duty(UnitKind::Officer, "1-A-1").await;

    let report = h.engine.reaper.sweep(Utc::now() - Duration::minutes(10)).await;

    assert!(report.is_empty());
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn failing_sweep_is_swallowed() {
    let h = harness();
    let now = Utc::now();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    h.store
        .set_unit_updated_at(officer.unit_ref(), now - Duration::hours(2))
        .await;
    h.store.fail_operation("delete_stale_units").await;

    let report = h.engine.reaper.sweep(now - Duration::hours(1)).await;

    assert!(report.is_empty());
    assert!(h.engine.reaper.try_sweep(now - Duration::hours(1)).await.is_err());
}

#[tokio::test]
async fn partial_release_is_reported() {
    let h = harness();
    let now = Utc::now();
    let officer = h.on_duty(UnitKind::Officer, "1-A-1").await;
    h.store
        .set_unit_updated_at(officer.unit_ref(), now - Duration::hours(2))
        .await;
    h.store
        .fail_operation_for("list_calls_for_unit", officer.id)
        .await;

    let report = h.engine.reaper.sweep(now - Duration::hours(1)).await;

    assert_eq!(report.released, vec![officer.unit_ref()]);
    assert_eq!(report.partially_released, vec![officer.unit_ref()]);
    assert_eq!(h.unit(&officer).await.status_id, None);
}

#[tokio::test]
async fn stale_bolos_expire_with_delete_events() {
    let mut h = harness();
    let now = Utc::now();
    let input = CreateBolo {
        bolo_type: "vehicle".to_string(),
        description: Some("Red sedan".to_string()),
        plate: Some("4XYZ123".to_string()),
        name: None,
    };
    let old = h.store.insert_bolo_at(&input, now - Duration::hours(3)).await;
    let fresh = h.store.insert_bolo_at(&input, now).await;

    let expired = h
        .engine
        .reaper
        .expire_bolos(now - Duration::hours(1))
        .await
        .unwrap();

    assert_eq!(expired, vec![old.id]);
    assert_eq!(h.drain(), vec![DispatchEvent::BoloDeleted { id: old.id }]);
    let remaining = cad_db::DispatchStore::list_bolos(h.store.as_ref()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, fresh.id);
}
