//! Unit duty and incident-assignment engine.
//!
//! - [`UnitDirectory`]: resolve an opaque unit id to its kind and row.
//! - [`InvolvedUnitSynchronizer`]: reconcile an incident's involved units.
//! - [`DutyController`]: on/off duty transitions and the off-duty cascade.
//! - [`InactivityReaper`]: lazy release of stale units and BOLOs.
//!
//! Every component works against the [`DispatchStore`](cad_db::DispatchStore)
//! port and notifies clients through the [`EventBus`](cad_events::EventBus)
//! after its writes succeed. [`DispatchEngine`] bundles them for callers
//! that need more than one.

use std::sync::Arc;

use cad_db::DispatchStore;
use cad_events::EventBus;

pub mod directory;
pub mod duty;
pub mod reaper;
pub mod synchronizer;

pub use directory::{ResolvedUnit, UnitDirectory};
pub use duty::{DutyController, DutyOutcome, OffDutyReport, OffDutyStep};
pub use reaper::{filter_inactive_units, InactivityReaper, ReaperReport};
pub use synchronizer::InvolvedUnitSynchronizer;

/// All engine components sharing one store and one bus.
#[derive(Clone)]
pub struct DispatchEngine {
    pub directory: UnitDirectory,
    pub synchronizer: InvolvedUnitSynchronizer,
    pub duty: DutyController,
    pub reaper: InactivityReaper,
}

impl DispatchEngine {
    pub fn new(store: Arc<dyn DispatchStore>, bus: Arc<EventBus>) -> Self {
        let directory = UnitDirectory::new(Arc::clone(&store));
        let duty = DutyController::new(Arc::clone(&store), Arc::clone(&bus));
        Self {
            synchronizer: InvolvedUnitSynchronizer::new(
                Arc::clone(&store),
                Arc::clone(&bus),
                directory.clone(),
            ),
            reaper: InactivityReaper::new(store, bus, duty.clone()),
            directory,
            duty,
        }
    }
}
