//! Unit kinds, tagged unit references, and directory filters.
//!
//! A "unit" is anything that can be dispatched: an officer, an EMS/FD
//! deputy, or a combined grouping of either family. The four kinds live in
//! four tables but share one id sequence, so a bare [`DbId`] identifies a
//! unit unambiguously once the directory has found its table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// UnitKind
// ---------------------------------------------------------------------------

/// The concrete table a unit lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Officer,
    EmsFdDeputy,
    CombinedLeo,
    CombinedEmsFd,
}

impl UnitKind {
    /// Directory lookup order. The first table that yields a match wins.
    pub const PRIORITY: [UnitKind; 4] = [
        UnitKind::Officer,
        UnitKind::EmsFdDeputy,
        UnitKind::CombinedLeo,
        UnitKind::CombinedEmsFd,
    ];

    /// The database / wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Officer => "officer",
            UnitKind::EmsFdDeputy => "ems_fd_deputy",
            UnitKind::CombinedLeo => "combined_leo",
            UnitKind::CombinedEmsFd => "combined_ems_fd",
        }
    }

    /// Which incident family this unit can be involved in.
    pub fn family(self) -> IncidentKind {
        match self {
            UnitKind::Officer | UnitKind::CombinedLeo => IncidentKind::Leo,
            UnitKind::EmsFdDeputy | UnitKind::CombinedEmsFd => IncidentKind::EmsFd,
        }
    }

    /// Only LEO units carry an active-incident pointer.
    pub fn tracks_active_incident(self) -> bool {
        self.family() == IncidentKind::Leo
    }

    /// Combined units are merged groupings that get deleted when stale.
    pub fn is_combined(self) -> bool {
        matches!(self, UnitKind::CombinedLeo | UnitKind::CombinedEmsFd)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "officer" => Ok(UnitKind::Officer),
            "ems_fd_deputy" => Ok(UnitKind::EmsFdDeputy),
            "combined_leo" => Ok(UnitKind::CombinedLeo),
            "combined_ems_fd" => Ok(UnitKind::CombinedEmsFd),
            other => Err(CoreError::Validation(format!("Unknown unit kind: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// IncidentKind
// ---------------------------------------------------------------------------

/// The two incident tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    Leo,
    #[serde(alias = "ems-fd")]
    EmsFd,
}

impl IncidentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IncidentKind::Leo => "leo",
            IncidentKind::EmsFd => "ems_fd",
        }
    }

    /// Unit kinds that may be attached to an incident of this kind, in
    /// directory priority order.
    pub fn unit_kinds(self) -> &'static [UnitKind] {
        match self {
            IncidentKind::Leo => &[UnitKind::Officer, UnitKind::CombinedLeo],
            IncidentKind::EmsFd => &[UnitKind::EmsFdDeputy, UnitKind::CombinedEmsFd],
        }
    }
}

impl fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentKind {
    type Err = CoreError;

    /// Accepts both the storage spelling (`ems_fd`) and the URL spelling (`ems-fd`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "leo" => Ok(IncidentKind::Leo),
            "ems_fd" | "ems-fd" => Ok(IncidentKind::EmsFd),
            other => Err(CoreError::Validation(format!(
                "Unknown incident kind: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// UnitRef
// ---------------------------------------------------------------------------

/// Tagged reference to exactly one unit.
///
/// Join rows (involved units, assigned units, dispatch chats) store one of
/// these instead of four nullable foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitRef {
    pub kind: UnitKind,
    pub id: DbId,
}

impl UnitRef {
    pub fn new(kind: UnitKind, id: DbId) -> Self {
        Self { kind, id }
    }
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// ---------------------------------------------------------------------------
// UnitFilter
// ---------------------------------------------------------------------------

/// Extra predicate applied by the unit directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitFilter {
    #[default]
    Any,
    /// The unit has a status and that status is not an off-duty code.
    NotOffDuty,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_its_name() {
        for kind in UnitKind::PRIORITY {
            assert_eq!(kind.as_str().parse::<UnitKind>().unwrap(), kind);
        }
    }

    #[test]
    fn only_leo_kinds_track_active_incidents() {
        assert!(UnitKind::Officer.tracks_active_incident());
        assert!(UnitKind::CombinedLeo.tracks_active_incident());
        assert!(!UnitKind::EmsFdDeputy.tracks_active_incident());
        assert!(!UnitKind::CombinedEmsFd.tracks_active_incident());
    }

    #[test]
    fn incident_kind_accepts_url_spelling() {
        assert_eq!("ems-fd".parse::<IncidentKind>().unwrap(), IncidentKind::EmsFd);
        assert_eq!("ems_fd".parse::<IncidentKind>().unwrap(), IncidentKind::EmsFd);
        assert!("fire".parse::<IncidentKind>().is_err());
    }

    #[test]
    fn incident_families_partition_unit_kinds() {
        for kind in UnitKind::PRIORITY {
            assert!(kind.family().unit_kinds().contains(&kind));
        }
    }
}
