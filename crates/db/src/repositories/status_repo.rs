//! Repository for the `status_values` table.

use cad_core::types::DbId;
use sqlx::PgPool;

use crate::models::status::StatusValue;

const COLUMNS: &str = "id, value, should_do";

/// Read access to status codes.
pub struct StatusRepo;

impl StatusRepo {
    /// Find a status code by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StatusValue>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM status_values WHERE id = $1");
        sqlx::query_as::<_, StatusValue>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all status codes.
    pub async fn list(pool: &PgPool) -> Result<Vec<StatusValue>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM status_values ORDER BY id ASC");
        sqlx::query_as::<_, StatusValue>(&query).fetch_all(pool).await
    }
}
