//! Incident and involved-unit models.

use cad_core::types::{DbId, Timestamp};
use cad_core::unit::{IncidentKind, UnitRef};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::models::unit_ref_from_row;

/// A row from `leo_incidents` or `ems_fd_incidents`.
#[derive(Debug, Clone, FromRow)]
pub struct IncidentRow {
    pub id: DbId,
    pub case_number: i32,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An incident together with its involved units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Incident {
    pub id: DbId,
    pub kind: IncidentKind,
    pub case_number: i32,
    pub description: Option<String>,
    pub is_active: bool,
    pub units_involved: Vec<InvolvedUnit>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Incident {
    pub fn from_parts(kind: IncidentKind, row: IncidentRow, units_involved: Vec<InvolvedUnit>) -> Self {
        Self {
            id: row.id,
            kind,
            case_number: row.case_number,
            description: row.description,
            is_active: row.is_active,
            units_involved,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    /// Ids of every involved unit.
    pub fn involved_unit_ids(&self) -> impl Iterator<Item = DbId> + '_ {
        self.units_involved.iter().map(|iu| iu.unit.id)
    }
}

/// A row from `incident_involved_units`: one unit attached to one incident.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvolvedUnit {
    pub id: DbId,
    pub incident_id: DbId,
    pub incident_kind: IncidentKind,
    pub unit: UnitRef,
    pub created_at: Timestamp,
}

impl<'r> FromRow<'r, PgRow> for InvolvedUnit {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let incident_kind: String = row.try_get("incident_kind")?;
        Ok(Self {
            id: row.try_get("id")?,
            incident_id: row.try_get("incident_id")?,
            incident_kind: incident_kind.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "incident_kind".to_string(),
                source: Box::new(e),
            })?,
            unit: unit_ref_from_row(row)?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// An involvement of one unit joined with its incident's `is_active` flag.
#[derive(Debug, Clone, FromRow)]
pub struct UnitInvolvementRow {
    pub id: DbId,
    pub incident_id: DbId,
    pub incident_is_active: bool,
    pub created_at: Timestamp,
}

/// DTO for opening an incident.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateIncident {
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
