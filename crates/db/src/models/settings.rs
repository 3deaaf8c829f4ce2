//! Tenant dispatch settings.

use cad_core::settings::DEFAULT_MAX_ASSIGNMENTS_TO_INCIDENTS;
use cad_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// The `cad_settings` row. Read fresh on every engine invocation.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CadSettings {
    pub max_assignments_to_incidents: i32,
    /// `None` disables the unit inactivity sweep.
    pub unit_inactivity_timeout_mins: Option<i32>,
    /// `None` disables BOLO expiry.
    pub bolo_inactivity_timeout_mins: Option<i32>,
    pub updated_at: Option<Timestamp>,
}

impl Default for CadSettings {
    fn default() -> Self {
        Self {
            max_assignments_to_incidents: DEFAULT_MAX_ASSIGNMENTS_TO_INCIDENTS,
            unit_inactivity_timeout_mins: None,
            bolo_inactivity_timeout_mins: None,
            updated_at: None,
        }
    }
}
