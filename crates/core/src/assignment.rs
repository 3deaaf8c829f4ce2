//! Per-unit outcomes of an involved-unit reconciliation.
//!
//! Reconciling an incident never fails because of a single unit. Units
//! that cannot be attached or detached are reported with the reason so
//! callers (and tests) can tell a cap hit from a missing unit.

use serde::Serialize;

use crate::types::DbId;
use crate::unit::UnitKind;

/// Why a unit was left out of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No unit with this id in the incident's family, or it is off duty.
    UnitUnavailable,
    /// The unit already works `active` active incidents and the cap is `max`.
    CapacityExceeded { active: u32, max: u32 },
    /// The incident lists the unit but no involvement row was found.
    InvolvementMissing,
    /// Storage failed for this unit only.
    StoreFailure { message: String },
}

/// Result for one unit in a reconciliation batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnitOutcome {
    Connected {
        unit_id: DbId,
        kind: UnitKind,
        active_incident_id: Option<DbId>,
    },
    Disconnected {
        unit_id: DbId,
        kind: UnitKind,
        active_incident_id: Option<DbId>,
    },
    Skipped {
        unit_id: DbId,
        #[serde(flatten)]
        reason: SkipReason,
    },
}

impl UnitOutcome {
    pub fn unit_id(&self) -> DbId {
        match self {
            UnitOutcome::Connected { unit_id, .. }
            | UnitOutcome::Disconnected { unit_id, .. }
            | UnitOutcome::Skipped { unit_id, .. } => *unit_id,
        }
    }
}

/// Batch report for one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub outcomes: Vec<UnitOutcome>,
}

impl ReconcileReport {
    pub fn connected(&self) -> impl Iterator<Item = DbId> + '_ {
        self.outcomes.iter().filter_map(|o| match o {
            UnitOutcome::Connected { unit_id, .. } => Some(*unit_id),
            _ => None,
        })
    }

    pub fn disconnected(&self) -> impl Iterator<Item = DbId> + '_ {
        self.outcomes.iter().filter_map(|o| match o {
            UnitOutcome::Disconnected { unit_id, .. } => Some(*unit_id),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (DbId, &SkipReason)> + '_ {
        self.outcomes.iter().filter_map(|o| match o {
            UnitOutcome::Skipped { unit_id, reason } => Some((*unit_id, reason)),
            _ => None,
        })
    }

    /// Outcome recorded for `unit_id`, if the unit was part of the diff.
    pub fn outcome_for(&self, unit_id: DbId) -> Option<&UnitOutcome> {
        self.outcomes.iter().find(|o| o.unit_id() == unit_id)
    }

    /// True when the diff was empty.
    pub fn is_noop(&self) -> bool {
        self.outcomes.is_empty()
    }
}
