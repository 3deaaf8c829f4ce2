//! Officer log model: one continuous on-duty session of a unit.

use cad_core::types::{DbId, Timestamp};
use cad_core::unit::UnitRef;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::models::unit_ref_from_row;

/// A row from the `officer_logs` table. `ended_at` is `None` while open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfficerLog {
    pub id: DbId,
    pub unit: UnitRef,
    pub user_id: DbId,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

impl OfficerLog {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

impl<'r> FromRow<'r, PgRow> for OfficerLog {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            unit: unit_ref_from_row(row)?,
            user_id: row.try_get("user_id")?,
            started_at: row.try_get("started_at")?,
            ended_at: row.try_get("ended_at")?,
        })
    }
}
