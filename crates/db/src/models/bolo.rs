//! BOLO ("be on the look out") models and DTOs.

use cad_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `bolos` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Bolo {
    pub id: DbId,
    /// `vehicle`, `person` or `other`.
    pub bolo_type: String,
    pub description: Option<String>,
    pub plate: Option<String>,
    pub name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a BOLO.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBolo {
    pub bolo_type: String,
    pub description: Option<String>,
    pub plate: Option<String>,
    pub name: Option<String>,
}

/// DTO for updating a BOLO. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBolo {
    pub bolo_type: Option<String>,
    pub description: Option<String>,
    pub plate: Option<String>,
    pub name: Option<String>,
}
