//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use cad_core::unit::{IncidentKind, UnitKind};
use cad_db::models::incident::Incident;
use cad_db::models::unit::Unit;
use cad_db::store::memory::BUSY_STATUS_ID;
use cad_db::{DispatchStore, MemoryDispatchStore};
use cad_engine::DispatchEngine;
use cad_events::{DispatchEvent, EventBus};
use tokio::sync::broadcast;

pub struct Harness {
    pub store: Arc<MemoryDispatchStore>,
    pub bus: Arc<EventBus>,
    pub engine: DispatchEngine,
    pub events: broadcast::Receiver<DispatchEvent>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryDispatchStore::new());
    let bus = Arc::new(EventBus::default());
    let events = bus.subscribe();
    let dyn_store: Arc<dyn DispatchStore> = store.clone();
    let engine = DispatchEngine::new(dyn_store, Arc::clone(&bus));
    Harness {
        store,
        bus,
        engine,
        events,
    }
}

impl Harness {
    /// An on-duty unit (status `10-6`).
    pub async fn on_duty(&self, kind: UnitKind, callsign: &str) -> Unit {
        self.store.insert_unit(kind, callsign, Some(BUSY_STATUS_ID)).await
    }

    pub async fn incident(&self, kind: IncidentKind) -> Incident {
        self.store.insert_incident(kind, true).await
    }

    /// Re-read an incident with its current involved units.
    pub async fn reload(&self, incident: &Incident) -> Incident {
        self.store
            .find_incident(incident.kind, incident.id)
            .await
            .expect("store should answer")
            .expect("incident should exist")
    }

    pub async fn unit(&self, unit: &Unit) -> Unit {
        self.store
            .unit(unit.unit_ref())
            .await
            .expect("unit should exist")
    }

    /// Reconcile against the stored state of `incident`.
    pub async fn reconcile(
        &self,
        incident: &Incident,
        desired: &[i64],
        max: u32,
    ) -> cad_core::assignment::ReconcileReport {
        let current = self.reload(incident).await;
        self.engine.synchronizer.reconcile(&current, desired, max).await
    }

    /// Everything published since the last drain.
    pub fn drain(&mut self) -> Vec<DispatchEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
