//! Tenant dispatch settings: defaults, validation, and timeout cutoffs.

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default per-unit cap on concurrently active incident assignments.
pub const DEFAULT_MAX_ASSIGNMENTS_TO_INCIDENTS: i32 = 1;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate the assignment cap and return it as a count.
pub fn validate_max_assignments(value: i32) -> Result<u32, CoreError> {
    match u32::try_from(value) {
        Ok(cap) if cap >= 1 => Ok(cap),
        _ => Err(CoreError::Validation(
            "max_assignments_to_incidents must be at least 1".to_string(),
        )),
    }
}

// ---------------------------------------------------------------------------
// Cutoffs
// ---------------------------------------------------------------------------

/// Last acceptable heartbeat time for a timeout, or `None` when disabled.
pub fn inactivity_cutoff(now: Timestamp, timeout_mins: Option<i32>) -> Option<Timestamp> {
    timeout_mins.map(|mins| now - chrono::Duration::minutes(i64::from(mins)))
}
