//! Repository for the `officer_logs` table.

use cad_core::types::DbId;
use cad_core::unit::UnitRef;
use sqlx::PgPool;

use crate::models::officer_log::OfficerLog;

const COLUMNS: &str = "id, unit_kind, unit_id, user_id, started_at, ended_at";

/// Provides open/close operations for on-duty sessions.
pub struct OfficerLogRepo;

impl OfficerLogRepo {
    /// Find the unit's open log, if any.
    pub async fn find_open(pool: &PgPool, unit: UnitRef) -> Result<Option<OfficerLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM officer_logs \
             WHERE unit_kind = $1 AND unit_id = $2 AND ended_at IS NULL"
        );
        sqlx::query_as::<_, OfficerLog>(&query)
            .bind(unit.kind.as_str())
            .bind(unit.id)
            .fetch_optional(pool)
            .await
    }

    /// Open a new log starting now.
    ///
    /// The partial unique index `uq_officer_logs_open` rejects a second open
    /// log for the same unit.
    pub async fn open(pool: &PgPool, unit: UnitRef, user_id: DbId) -> Result<OfficerLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO officer_logs (unit_kind, unit_id, user_id) VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OfficerLog>(&query)
            .bind(unit.kind.as_str())
            .bind(unit.id)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Stamp `ended_at` on the unit's open log. Returns the closed log, if any.
    pub async fn close_open(pool: &PgPool, unit: UnitRef) -> Result<Option<OfficerLog>, sqlx::Error> {
        let query = format!(
            "UPDATE officer_logs SET ended_at = NOW() \
             WHERE unit_kind = $1 AND unit_id = $2 AND ended_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OfficerLog>(&query)
            .bind(unit.kind.as_str())
            .bind(unit.id)
            .fetch_optional(pool)
            .await
    }
}
