//! Repository for the `incident_involved_units` join table.

use cad_core::types::DbId;
use cad_core::unit::{IncidentKind, UnitRef};
use sqlx::PgPool;

use crate::models::incident::{InvolvedUnit, UnitInvolvementRow};
use crate::repositories::incident_repo;

const COLUMNS: &str = "id, incident_kind, incident_id, unit_kind, unit_id, created_at";

/// Provides connect / disconnect operations between units and incidents.
pub struct InvolvedUnitRepo;

impl InvolvedUnitRepo {
    /// Involved units of one incident, oldest first.
    pub async fn list_for_incident(
        pool: &PgPool,
        kind: IncidentKind,
        incident_id: DbId,
    ) -> Result<Vec<InvolvedUnit>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM incident_involved_units \
             WHERE incident_kind = $1 AND incident_id = $2 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, InvolvedUnit>(&query)
            .bind(kind.as_str())
            .bind(incident_id)
            .fetch_all(pool)
            .await
    }

    /// Every involvement of `unit`, joined with its incident's `is_active` flag.
    pub async fn list_for_unit(
        pool: &PgPool,
        unit: UnitRef,
    ) -> Result<Vec<UnitInvolvementRow>, sqlx::Error> {
        let family = unit.kind.family();
        let query = format!(
            "SELECT iu.id, iu.incident_id, i.is_active AS incident_is_active, iu.created_at \
             FROM incident_involved_units iu \
             JOIN {} i ON i.id = iu.incident_id \
             WHERE iu.incident_kind = $1 AND iu.unit_kind = $2 AND iu.unit_id = $3 \
             ORDER BY iu.created_at ASC, iu.id ASC",
            incident_repo::table(family)
        );
        sqlx::query_as::<_, UnitInvolvementRow>(&query)
            .bind(family.as_str())
            .bind(unit.kind.as_str())
            .bind(unit.id)
            .fetch_all(pool)
            .await
    }

    /// Count the unit's involvements in active incidents of `kind`.
    pub async fn count_active_for_unit(
        pool: &PgPool,
        unit: UnitRef,
        kind: IncidentKind,
    ) -> Result<i64, sqlx::Error> {
        let query = format!(
            "SELECT COUNT(*) FROM incident_involved_units iu \
             JOIN {} i ON i.id = iu.incident_id \
             WHERE iu.incident_kind = $1 AND iu.unit_kind = $2 AND iu.unit_id = $3 \
                   AND i.is_active = true",
            incident_repo::table(kind)
        );
        sqlx::query_scalar::<_, i64>(&query)
            .bind(kind.as_str())
            .bind(unit.kind.as_str())
            .bind(unit.id)
            .fetch_one(pool)
            .await
    }

    /// Attach `unit` to an incident.
    pub async fn create(
        pool: &PgPool,
        kind: IncidentKind,
        incident_id: DbId,
        unit: UnitRef,
    ) -> Result<InvolvedUnit, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let row = Self::create_in(&mut tx, kind, incident_id, unit).await?;
        tx.commit().await?;
        Ok(row)
    }

    /// Delete an involvement row, returning it if it still existed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<InvolvedUnit>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let row = Self::delete_in(&mut tx, id).await?;
        tx.commit().await?;
        Ok(row)
    }

    // -----------------------------------------------------------------------
    // Transaction variants
    // -----------------------------------------------------------------------

    pub async fn create_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        kind: IncidentKind,
        incident_id: DbId,
        unit: UnitRef,
    ) -> Result<InvolvedUnit, sqlx::Error> {
        let query = format!(
            "INSERT INTO incident_involved_units (incident_kind, incident_id, unit_kind, unit_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InvolvedUnit>(&query)
            .bind(kind.as_str())
            .bind(incident_id)
            .bind(unit.kind.as_str())
            .bind(unit.id)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn delete_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<InvolvedUnit>, sqlx::Error> {
        let query = format!("DELETE FROM incident_involved_units WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, InvolvedUnit>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }
}
