//! Active-incident pointer resolution.
//!
//! A LEO unit can be involved in several incidents at once but works one
//! of them at a time. Which one it resumes after leaving another is not
//! stored anywhere: it is derived from the unit's remaining involvement
//! rows every time the unit is unassigned. This module is the only place
//! that ordering rule lives.

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

/// Whether a unit is being attached to or detached from an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentDirection {
    Assign,
    Unassign,
}

/// What should happen to a unit's `active_incident_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveIncidentUpdate {
    /// Point the unit at this incident.
    Set(DbId),
    /// The unit has nothing left to work.
    Clear,
    /// Leave the pointer as it is.
    Unchanged,
}

impl ActiveIncidentUpdate {
    /// The pointer value after applying this update to `current`.
    pub fn apply(self, current: Option<DbId>) -> Option<DbId> {
        match self {
            ActiveIncidentUpdate::Set(id) => Some(id),
            ActiveIncidentUpdate::Clear => None,
            ActiveIncidentUpdate::Unchanged => current,
        }
    }
}

/// One involvement row belonging to the unit being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvolvementCandidate {
    /// Id of the involvement row; breaks `created_at` ties.
    pub involvement_id: DbId,
    pub incident_id: DbId,
    pub incident_is_active: bool,
    pub created_at: Timestamp,
}

/// Compute the next active-incident pointer for a unit.
///
/// - `force` returns `Set(incident_id)` regardless of direction.
/// - `Assign` only promotes the incident when the unit is idle.
/// - `Unassign` resumes the earliest-created remaining involvement, skipping
///   rows for `incident_id` itself when that incident is no longer active.
///   With no candidate left the pointer is cleared.
pub fn next_active_incident(
    current_active: Option<DbId>,
    incident_id: DbId,
    direction: AssignmentDirection,
    force: bool,
    involvements: &[InvolvementCandidate],
) -> ActiveIncidentUpdate {
    if force {
        return ActiveIncidentUpdate::Set(incident_id);
    }

    match direction {
        AssignmentDirection::Assign => match current_active {
            None => ActiveIncidentUpdate::Set(incident_id),
            Some(_) => ActiveIncidentUpdate::Unchanged,
        },
        AssignmentDirection::Unassign => involvements
            .iter()
            .filter(|c| !(c.incident_id == incident_id && !c.incident_is_active))
            .min_by_key(|c| (c.created_at, c.involvement_id))
            .map_or(ActiveIncidentUpdate::Clear, |c| {
                ActiveIncidentUpdate::Set(c.incident_id)
            }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
