//! Unit entity model (officers, EMS/FD deputies, combined units).

use cad_core::types::{DbId, Timestamp};
use cad_core::unit::{UnitKind, UnitRef};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::models::unit_kind_from_row;

/// A unit row from any of the four unit tables.
///
/// EMS/FD tables have no `active_incident_id` column; queries select
/// `NULL` in its place so every kind decodes into this one struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
    pub id: DbId,
    pub kind: UnitKind,
    pub callsign: String,
    pub status_id: Option<DbId>,
    pub active_call_id: Option<DbId>,
    pub active_incident_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Unit {
    pub fn unit_ref(&self) -> UnitRef {
        UnitRef::new(self.kind, self.id)
    }

    /// Temporary units are not bound to a login and keep no officer logs.
    pub fn is_temporary(&self) -> bool {
        self.user_id.is_none()
    }
}

impl<'r> FromRow<'r, PgRow> for Unit {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            kind: unit_kind_from_row(row, "unit_kind")?,
            callsign: row.try_get("callsign")?,
            status_id: row.try_get("status_id")?,
            active_call_id: row.try_get("active_call_id")?,
            active_incident_id: row.try_get("active_incident_id")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// DTO for registering a unit.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUnit {
    pub callsign: String,
    pub user_id: Option<DbId>,
    pub status_id: Option<DbId>,
}
