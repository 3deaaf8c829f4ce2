//! BOLO input rules.

use crate::error::CoreError;

pub const BOLO_TYPE_VEHICLE: &str = "vehicle";
pub const BOLO_TYPE_PERSON: &str = "person";
pub const BOLO_TYPE_OTHER: &str = "other";

/// Accepted `bolo_type` values.
pub const VALID_BOLO_TYPES: &[&str] = &[BOLO_TYPE_VEHICLE, BOLO_TYPE_PERSON, BOLO_TYPE_OTHER];

/// Longest description accepted.
const MAX_DESCRIPTION_LEN: usize = 2000;

pub fn validate_bolo_type(value: &str) -> Result<(), CoreError> {
    if VALID_BOLO_TYPES.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid bolo_type '{value}'. Must be one of: {}",
            VALID_BOLO_TYPES.join(", ")
        )))
    }
}

/// A BOLO must say what to look for: a description, a plate or a name.
pub fn validate_bolo_fields(
    description: Option<&str>,
    plate: Option<&str>,
    name: Option<&str>,
) -> Result<(), CoreError> {
    if let Some(desc) = description {
        if desc.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(CoreError::Validation(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }
    }
    let has_content = [description, plate, name]
        .into_iter()
        .flatten()
        .any(|s| !s.trim().is_empty());
    if !has_content {
        return Err(CoreError::Validation(
            "A BOLO needs a description, plate or name".to_string(),
        ));
    }
    Ok(())
}
