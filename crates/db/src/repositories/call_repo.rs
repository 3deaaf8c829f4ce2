//! Repository for `calls_911` and the `assigned_units` join table.

use std::collections::HashMap;

use cad_core::types::DbId;
use cad_core::unit::UnitRef;
use sqlx::PgPool;

use crate::models::call::{AssignedUnit, Call911, CallRow};

const COLUMNS: &str = "id, case_number, location, description, ended, created_at, updated_at";

const ASSIGNED_COLUMNS: &str = "id, call_id, unit_kind, unit_id, created_at";

/// Provides the call queries the dispatch engine needs.
pub struct CallRepo;

impl CallRepo {
    /// Calls that list `unit` among their assigned units, with all their assignments.
    pub async fn list_for_unit(pool: &PgPool, unit: UnitRef) -> Result<Vec<Call911>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM calls_911 c \
             WHERE EXISTS (SELECT 1 FROM assigned_units a \
                           WHERE a.call_id = c.id AND a.unit_kind = $1 AND a.unit_id = $2) \
             ORDER BY c.id ASC"
        );
        let rows = sqlx::query_as::<_, CallRow>(&query)
            .bind(unit.kind.as_str())
            .bind(unit.id)
            .fetch_all(pool)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let call_ids: Vec<DbId> = rows.iter().map(|c| c.id).collect();
        let query = format!(
            "SELECT {ASSIGNED_COLUMNS} FROM assigned_units \
             WHERE call_id = ANY($1) ORDER BY created_at ASC, id ASC"
        );
        let assigned = sqlx::query_as::<_, AssignedUnit>(&query)
            .bind(&call_ids)
            .fetch_all(pool)
            .await?;

        let mut by_call: HashMap<DbId, Vec<AssignedUnit>> = HashMap::new();
        for a in assigned {
            by_call.entry(a.call_id).or_default().push(a);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let units = by_call.remove(&row.id).unwrap_or_default();
                Call911::from_parts(row, units)
            })
            .collect())
    }

    /// Assign `unit` to a call.
    pub async fn assign_unit(
        pool: &PgPool,
        call_id: DbId,
        unit: UnitRef,
    ) -> Result<AssignedUnit, sqlx::Error> {
        let query = format!(
            "INSERT INTO assigned_units (call_id, unit_kind, unit_id) VALUES ($1, $2, $3) \
             RETURNING {ASSIGNED_COLUMNS}"
        );
        sqlx::query_as::<_, AssignedUnit>(&query)
            .bind(call_id)
            .bind(unit.kind.as_str())
            .bind(unit.id)
            .fetch_one(pool)
            .await
    }

    /// Delete every assignment of `unit`. Returns the number of rows removed.
    pub async fn delete_assignments_for_unit(pool: &PgPool, unit: UnitRef) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM assigned_units WHERE unit_kind = $1 AND unit_id = $2")
                .bind(unit.kind.as_str())
                .bind(unit.id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
