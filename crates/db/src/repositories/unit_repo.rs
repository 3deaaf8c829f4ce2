//! Repository for the four unit tables.
//!
//! `officers`, `ems_fd_deputies`, `combined_leo_units` and
//! `combined_ems_fd_units` share one id sequence and decode into the same
//! [`Unit`] struct. Every query names its kind with a literal
//! `unit_kind` column so the row knows which table it came from.

use cad_core::types::{DbId, Timestamp};
use cad_core::unit::{UnitFilter, UnitKind, UnitRef};
use sqlx::PgPool;

use crate::models::unit::{CreateUnit, Unit};

/// Table holding units of `kind`.
fn table(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Officer => "officers",
        UnitKind::EmsFdDeputy => "ems_fd_deputies",
        UnitKind::CombinedLeo => "combined_leo_units",
        UnitKind::CombinedEmsFd => "combined_ems_fd_units",
    }
}

/// Column list for `kind`, aliased to the shared [`Unit`] shape.
fn columns(kind: UnitKind) -> String {
    let active_incident = if kind.tracks_active_incident() {
        "u.active_incident_id"
    } else {
        "NULL::BIGINT AS active_incident_id"
    };
    format!(
        "u.id, '{kind}' AS unit_kind, u.callsign, u.status_id, u.active_call_id, \
         {active_incident}, u.user_id, u.created_at, u.updated_at",
        kind = kind.as_str()
    )
}

/// SQL predicate for a directory filter, applied to alias `u`.
fn filter_clause(filter: UnitFilter) -> &'static str {
    match filter {
        UnitFilter::Any => "",
        UnitFilter::NotOffDuty => {
            " AND u.status_id IS NOT NULL \
              AND NOT EXISTS (SELECT 1 FROM status_values s \
                              WHERE s.id = u.status_id AND s.should_do = 'set_off_duty')"
        }
    }
}

/// Provides queries and mutations over all unit kinds.
pub struct UnitRepo;

impl UnitRepo {
    // ── Queries ──────────────────────────────────────────────────────────

    /// Find a unit of `kind` by id, subject to `filter`.
    pub async fn find(
        pool: &PgPool,
        kind: UnitKind,
        id: DbId,
        filter: UnitFilter,
    ) -> Result<Option<Unit>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM {} u WHERE u.id = $1{}",
            columns(kind),
            table(kind),
            filter_clause(filter)
        );
        sqlx::query_as::<_, Unit>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every unit of `kind`, ordered by callsign.
    pub async fn list(pool: &PgPool, kind: UnitKind) -> Result<Vec<Unit>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM {} u ORDER BY u.callsign ASC, u.id ASC",
            columns(kind),
            table(kind)
        );
        sqlx::query_as::<_, Unit>(&query).fetch_all(pool).await
    }

    /// On-duty units of `kind` whose last update is older than `cutoff`.
    pub async fn list_stale(
        pool: &PgPool,
        kind: UnitKind,
        cutoff: Timestamp,
    ) -> Result<Vec<Unit>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM {} u WHERE u.updated_at < $1{}",
            columns(kind),
            table(kind),
            filter_clause(UnitFilter::NotOffDuty)
        );
        sqlx::query_as::<_, Unit>(&query)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Register a unit of `kind`.
    pub async fn create(
        pool: &PgPool,
        kind: UnitKind,
        input: &CreateUnit,
    ) -> Result<Unit, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} AS u (callsign, user_id, status_id) VALUES ($1, $2, $3) \
             RETURNING {}",
            table(kind),
            columns(kind)
        );
        sqlx::query_as::<_, Unit>(&query)
            .bind(&input.callsign)
            .bind(input.user_id)
            .bind(input.status_id)
            .fetch_one(pool)
            .await
    }

    /// Set (or clear) a unit's status. Returns `true` if the unit exists.
    pub async fn set_status(
        pool: &PgPool,
        unit: UnitRef,
        status_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let query = format!("UPDATE {} SET status_id = $2 WHERE id = $1", table(unit.kind));
        let result = sqlx::query(&query)
            .bind(unit.id)
            .bind(status_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set (or clear) a LEO unit's active-incident pointer.
    ///
    /// EMS/FD kinds have no pointer; the call is a no-op returning `false`.
    pub async fn set_active_incident(
        pool: &PgPool,
        unit: UnitRef,
        incident_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let updated = Self::set_active_incident_in(&mut tx, unit, incident_id).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// [`set_active_incident`](Self::set_active_incident) within an existing transaction.
    pub async fn set_active_incident_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        unit: UnitRef,
        incident_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        if !unit.kind.tracks_active_incident() {
            return Ok(false);
        }
        let query = format!(
            "UPDATE {} SET active_incident_id = $2 WHERE id = $1",
            table(unit.kind)
        );
        let result = sqlx::query(&query)
            .bind(unit.id)
            .bind(incident_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Null status, active call and (LEO only) active incident on `ids`.
    pub async fn clear_pointers(
        pool: &PgPool,
        kind: UnitKind,
        ids: &[DbId],
    ) -> Result<u64, sqlx::Error> {
        if ids.is_empty() {
            return Ok(0);
        }
        let incident = if kind.tracks_active_incident() {
            ", active_incident_id = NULL"
        } else {
            ""
        };
        let query = format!(
            "UPDATE {} SET status_id = NULL, active_call_id = NULL{incident} \
             WHERE id = ANY($1)",
            table(kind)
        );
        let result = sqlx::query(&query).bind(ids).execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Hard-delete units of `kind` last updated before `cutoff`, returning their ids.
    ///
    /// Their incident involvements and call assignments are deleted in the
    /// same transaction so no incident or call lists a unit that is gone.
    pub async fn delete_stale(
        pool: &PgPool,
        kind: UnitKind,
        cutoff: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "DELETE FROM {} WHERE updated_at < $1 RETURNING id",
            table(kind)
        );
        let ids = sqlx::query_scalar::<_, DbId>(&query)
            .bind(cutoff)
            .fetch_all(&mut *tx)
            .await?;

        if !ids.is_empty() {
            sqlx::query(
                "DELETE FROM incident_involved_units WHERE unit_kind = $1 AND unit_id = ANY($2)",
            )
            .bind(kind.as_str())
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
            sqlx::query("DELETE FROM assigned_units WHERE unit_kind = $1 AND unit_id = ANY($2)")
                .bind(kind.as_str())
                .bind(&ids)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(ids)
    }
}
