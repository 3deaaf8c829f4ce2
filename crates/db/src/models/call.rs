//! 911 call and assigned-unit models.
//!
//! Call records are managed elsewhere; the dispatch engine only needs a
//! call's assigned units so it can detach a unit going off duty.

use cad_core::types::{DbId, Timestamp};
use cad_core::unit::UnitRef;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::models::unit_ref_from_row;

/// A row from the `calls_911` table.
#[derive(Debug, Clone, FromRow)]
pub struct CallRow {
    pub id: DbId,
    pub case_number: i32,
    pub location: String,
    pub description: Option<String>,
    pub ended: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A call together with its assigned units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call911 {
    pub id: DbId,
    pub case_number: i32,
    pub location: String,
    pub description: Option<String>,
    pub ended: bool,
    pub assigned_units: Vec<AssignedUnit>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Call911 {
    pub fn from_parts(row: CallRow, assigned_units: Vec<AssignedUnit>) -> Self {
        Self {
            id: row.id,
            case_number: row.case_number,
            location: row.location,
            description: row.description,
            ended: row.ended,
            assigned_units,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row from `assigned_units`: one unit attached to one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedUnit {
    pub id: DbId,
    pub call_id: DbId,
    pub unit: UnitRef,
    pub created_at: Timestamp,
}

impl<'r> FromRow<'r, PgRow> for AssignedUnit {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            call_id: row.try_get("call_id")?,
            unit: unit_ref_from_row(row)?,
            created_at: row.try_get("created_at")?,
        })
    }
}
