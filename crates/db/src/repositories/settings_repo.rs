//! Repository for the single-row `cad_settings` table.

use sqlx::PgPool;

use crate::models::settings::CadSettings;

/// Read access to tenant dispatch settings.
pub struct SettingsRepo;

impl SettingsRepo {
    /// Load the settings row, falling back to defaults when it is missing.
    pub async fn get(pool: &PgPool) -> Result<CadSettings, sqlx::Error> {
        let row = sqlx::query_as::<_, CadSettings>(
            "SELECT max_assignments_to_incidents, unit_inactivity_timeout_mins, \
                    bolo_inactivity_timeout_mins, updated_at \
             FROM cad_settings WHERE id = 1",
        )
        .fetch_optional(pool)
        .await?;
        Ok(row.unwrap_or_default())
    }
}
