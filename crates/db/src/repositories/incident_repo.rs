//! Repository for `leo_incidents` and `ems_fd_incidents`.

use cad_core::types::DbId;
use cad_core::unit::IncidentKind;
use sqlx::PgPool;

use crate::models::incident::{CreateIncident, Incident, IncidentRow};
use crate::repositories::InvolvedUnitRepo;

const COLUMNS: &str = "id, case_number, description, is_active, created_at, updated_at";

/// Table holding incidents of `kind`.
pub(crate) fn table(kind: IncidentKind) -> &'static str {
    match kind {
        IncidentKind::Leo => "leo_incidents",
        IncidentKind::EmsFd => "ems_fd_incidents",
    }
}

/// Provides incident lookups with their involved units.
pub struct IncidentRepo;

impl IncidentRepo {
    /// Find an incident and load its involved units.
    pub async fn find_by_id(
        pool: &PgPool,
        kind: IncidentKind,
        id: DbId,
    ) -> Result<Option<Incident>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM {} WHERE id = $1", table(kind));
        let Some(row) = sqlx::query_as::<_, IncidentRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };

        let involved = InvolvedUnitRepo::list_for_incident(pool, kind, id).await?;
        Ok(Some(Incident::from_parts(kind, row, involved)))
    }

    /// Open a new incident with no involved units.
    pub async fn create(
        pool: &PgPool,
        kind: IncidentKind,
        input: &CreateIncident,
    ) -> Result<Incident, sqlx::Error> {
        let query = format!(
            "INSERT INTO {} (description, is_active) VALUES ($1, COALESCE($2, true)) \
             RETURNING {COLUMNS}",
            table(kind)
        );
        let row = sqlx::query_as::<_, IncidentRow>(&query)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_one(pool)
            .await?;
        Ok(Incident::from_parts(kind, row, Vec::new()))
    }

    /// Mark an incident active or ended. Returns `true` if it exists.
    pub async fn set_active(
        pool: &PgPool,
        kind: IncidentKind,
        id: DbId,
        is_active: bool,
    ) -> Result<bool, sqlx::Error> {
        let query = format!("UPDATE {} SET is_active = $2 WHERE id = $1", table(kind));
        let result = sqlx::query(&query)
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
