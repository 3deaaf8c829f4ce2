//! Repository for the `dispatch_chats` table.

use cad_core::unit::UnitRef;
use sqlx::PgPool;

/// Provides bulk cleanup of unit chat threads.
pub struct DispatchChatRepo;

impl DispatchChatRepo {
    /// Delete every chat message of the given units. Returns the row count.
    pub async fn delete_for_units(pool: &PgPool, units: &[UnitRef]) -> Result<u64, sqlx::Error> {
        if units.is_empty() {
            return Ok(0);
        }
        let kinds: Vec<String> = units.iter().map(|u| u.kind.as_str().to_string()).collect();
        let ids: Vec<i64> = units.iter().map(|u| u.id).collect();
        let result = sqlx::query(
            "DELETE FROM dispatch_chats \
             WHERE (unit_kind, unit_id) IN (SELECT * FROM UNNEST($1::TEXT[], $2::BIGINT[]))",
        )
        .bind(&kinds)
        .bind(&ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
