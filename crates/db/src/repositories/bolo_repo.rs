//! Repository for the `bolos` table.

use cad_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::bolo::{Bolo, CreateBolo, UpdateBolo};

const COLUMNS: &str = "id, bolo_type, description, plate, name, created_at, updated_at";

/// Provides CRUD operations for BOLOs.
pub struct BoloRepo;

impl BoloRepo {
    /// List all BOLOs, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Bolo>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM bolos ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Bolo>(&query).fetch_all(pool).await
    }

    /// Insert a new BOLO, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateBolo) -> Result<Bolo, sqlx::Error> {
        let query = format!(
            "INSERT INTO bolos (bolo_type, description, plate, name) VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Bolo>(&query)
            .bind(&input.bolo_type)
            .bind(&input.description)
            .bind(&input.plate)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Update a BOLO. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateBolo,
    ) -> Result<Option<Bolo>, sqlx::Error> {
        let query = format!(
            "UPDATE bolos SET
                bolo_type = COALESCE($2, bolo_type),
                description = COALESCE($3, description),
                plate = COALESCE($4, plate),
                name = COALESCE($5, name)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Bolo>(&query)
            .bind(id)
            .bind(&input.bolo_type)
            .bind(&input.description)
            .bind(&input.plate)
            .bind(&input.name)
            .fetch_optional(pool)
            .await
    }

    /// Delete a BOLO. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bolos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete BOLOs last updated before `cutoff`, returning their ids.
    pub async fn delete_older_than(pool: &PgPool, cutoff: Timestamp) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("DELETE FROM bolos WHERE updated_at < $1 RETURNING id")
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }
}
