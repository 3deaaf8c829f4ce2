//! One officer across two incidents, from assignment to end of shift.

mod common;

use cad_core::unit::{IncidentKind, UnitKind};
use cad_events::DispatchEvent;

use common::harness;

#[tokio::test]
async fn officer_moves_between_incidents_and_signs_off() {
    let mut h = harness();
    let o1 = h.on_duty(UnitKind::Officer, "1-A-1").await;
    h.engine.duty.go_on_duty(&o1).await.unwrap();
    let a = h.incident(IncidentKind::Leo).await;
    let b = h.incident(IncidentKind::Leo).await;

    // Assigned to A while idle: A becomes active.
    h.reconcile(&a, &[o1.id], 2).await;
    assert_eq!(h.unit(&o1).await.active_incident_id, Some(a.id));

    // Also assigned to B: still working A.
    h.reconcile(&b, &[o1.id], 2).await;
    assert_eq!(h.unit(&o1).await.active_incident_id, Some(a.id));

    // Dropped from A: resumes B.
    h.reconcile(&a, &[], 2).await;
    assert_eq!(h.unit(&o1).await.active_incident_id, Some(b.id));
    assert!(h.reload(&a).await.units_involved.is_empty());
    h.drain();

    // Off duty: B is broadcast without O1, but storage keeps the row and pointer.
    let report = h.engine.duty.sign_off(&o1).await;
    assert!(report.is_clean());
    assert!(report.closed_log.is_some());

    let after = h.unit(&o1).await;
    assert_eq!(after.status_id, None);
    assert_eq!(after.active_incident_id, Some(b.id));
    assert_eq!(h.reload(&b).await.involved_unit_ids().collect::<Vec<_>>(), vec![o1.id]);

    let events = h.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        DispatchEvent::ActiveIncidentUpdated(i) if i.id == b.id && i.units_involved.is_empty()
    )));
    assert_eq!(events.last(), Some(&DispatchEvent::OfficerStatusUpdated));
}
