//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - An entity struct matching the database row (`FromRow` + `Serialize`)
//! - `Deserialize` create / update DTOs where the HTTP layer writes the entity
//!
//! Rows that reference a unit carry a `unit_kind` + `unit_id` column pair
//! which decodes into a tagged [`UnitRef`].

use cad_core::unit::{UnitKind, UnitRef};
use sqlx::postgres::PgRow;
use sqlx::Row;

pub mod bolo;
pub mod call;
pub mod dispatch_chat;
pub mod incident;
pub mod officer_log;
pub mod settings;
pub mod status;
pub mod unit;

/// Decode the `unit_kind` column into a [`UnitKind`].
pub(crate) fn unit_kind_from_row(row: &PgRow, column: &str) -> Result<UnitKind, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Decode the `unit_kind` + `unit_id` column pair into a [`UnitRef`].
pub(crate) fn unit_ref_from_row(row: &PgRow) -> Result<UnitRef, sqlx::Error> {
    Ok(UnitRef {
        kind: unit_kind_from_row(row, "unit_kind")?,
        id: row.try_get("unit_id")?,
    })
}
