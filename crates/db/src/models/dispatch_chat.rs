//! Dispatch chat model.

use cad_core::types::{DbId, Timestamp};
use cad_core::unit::UnitRef;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::models::unit_ref_from_row;

/// A row from `dispatch_chats`: one message in a unit's thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchChat {
    pub id: DbId,
    pub unit: UnitRef,
    pub call_id: Option<DbId>,
    pub incident_id: Option<DbId>,
    pub message: String,
    pub created_at: Timestamp,
}

impl<'r> FromRow<'r, PgRow> for DispatchChat {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            unit: unit_ref_from_row(row)?,
            call_id: row.try_get("call_id")?,
            incident_id: row.try_get("incident_id")?,
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
