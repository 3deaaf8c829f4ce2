//! Status code model.

use cad_core::status::ShouldDo;
use cad_core::types::DbId;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

/// A row from the `status_values` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusValue {
    pub id: DbId,
    /// Display code, e.g. `"10-8"`.
    pub value: String,
    pub should_do: ShouldDo,
}

impl<'r> FromRow<'r, PgRow> for StatusValue {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let should_do: String = row.try_get("should_do")?;
        Ok(Self {
            id: row.try_get("id")?,
            value: row.try_get("value")?,
            should_do: should_do.parse().map_err(|e| sqlx::Error::ColumnDecode {
                index: "should_do".to_string(),
                source: Box::new(e),
            })?,
        })
    }
}
