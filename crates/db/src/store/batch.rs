//! Writes that must land together.
//!
//! The synchronizer pairs an involvement row change with the unit's
//! active-incident pointer. [`DispatchStore::execute_batch`] applies such a
//! group atomically: either every write commits or none does.
//!
//! [`DispatchStore::execute_batch`]: super::DispatchStore::execute_batch

use cad_core::types::DbId;
use cad_core::unit::{IncidentKind, UnitRef};

use crate::models::incident::InvolvedUnit;

/// One write inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchWrite {
    /// No-op for kinds without an active-incident pointer.
    SetActiveIncident {
        unit: UnitRef,
        incident_id: Option<DbId>,
    },
    CreateInvolvement {
        kind: IncidentKind,
        incident_id: DbId,
        unit: UnitRef,
    },
    DeleteInvolvement { id: DbId },
}

impl BatchWrite {
    /// Name of the single-write store operation this corresponds to.
    pub fn operation(&self) -> &'static str {
        match self {
            BatchWrite::SetActiveIncident { .. } => "set_active_incident",
            BatchWrite::CreateInvolvement { .. } => "create_involvement",
            BatchWrite::DeleteInvolvement { .. } => "delete_involvement",
        }
    }
}

/// Result of one [`BatchWrite`], in the same position as the write.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchResult {
    /// `true` if a unit row was updated.
    ActiveIncidentSet(bool),
    InvolvementCreated(InvolvedUnit),
    /// The deleted row, or `None` if it was already gone.
    InvolvementDeleted(Option<InvolvedUnit>),
}
