//! Input validation for task identities and output sub-paths.
//!
//! Every user-supplied name that ends up inside an object key is validated
//! here before any path derivation happens, preventing path traversal and
//! keys that the store backends cannot represent. A name that fails
//! validation is reported as a malformed identity with no I/O attempted.

use crate::errors::TrackerError;

/// Maximum allowed length for step names, parameter keys and subdir names.
pub const MAX_NAME_LENGTH: usize = 128;

/// Maximum allowed length for parameter values.
pub const MAX_VALUE_LENGTH: usize = 256;

/// Reserved names that cannot be used as path segments (case-insensitive).
const RESERVED_NAMES: &[&str] = &[
    ".", "..", "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7",
    "com8", "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Validates that a name is safe for use as an object-key segment.
///
/// A name is valid if it is non-empty, no longer than [`MAX_NAME_LENGTH`]
/// characters, contains only alphanumeric characters, dashes, and
/// underscores, and does not collide with a reserved system name.
///
/// # Returns
///
/// * `Ok(())` if the name is valid
/// * `Err(TrackerError::MalformedIdentity)` with a descriptive message otherwise
pub fn validate_name(name: &str) -> Result<(), TrackerError> {
    if name.is_empty() {
        return Err(TrackerError::MalformedIdentity(
            "name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(TrackerError::MalformedIdentity(format!(
            "name too long: {} characters (max {MAX_NAME_LENGTH})",
            name.len()
        )));
    }

    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid_chars {
        return Err(TrackerError::MalformedIdentity(format!(
            "name '{name}' contains invalid characters. Use only alphanumeric characters, dashes (-), and underscores (_)"
        )));
    }

    let lower = name.to_lowercase();
    if RESERVED_NAMES.contains(&lower.as_str()) {
        return Err(TrackerError::MalformedIdentity(format!(
            "name '{name}' uses a reserved name"
        )));
    }

    Ok(())
}

/// Validates a task parameter value.
///
/// Values follow the same rules as names but additionally allow dots, so
/// version-like values (`v1.2`) survive as path segments.
pub fn validate_param_value(value: &str) -> Result<(), TrackerError> {
    if value.is_empty() {
        return Err(TrackerError::MalformedIdentity(
            "parameter value cannot be empty".to_string(),
        ));
    }

    if value.len() > MAX_VALUE_LENGTH {
        return Err(TrackerError::MalformedIdentity(format!(
            "parameter value too long: {} characters (max {MAX_VALUE_LENGTH})",
            value.len()
        )));
    }

    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !valid_chars {
        return Err(TrackerError::MalformedIdentity(format!(
            "parameter value '{value}' contains invalid characters"
        )));
    }

    if value.chars().all(|c| c == '.') {
        return Err(TrackerError::MalformedIdentity(format!(
            "parameter value '{value}' is not a valid path segment"
        )));
    }

    Ok(())
}

/// Validates an optional sub-output directory name.
pub fn validate_subdir(subdir: &str) -> Result<(), TrackerError> {
    validate_name(subdir).map_err(|_| {
        TrackerError::MalformedIdentity(format!(
            "subdir '{subdir}' is not a valid directory name. Use only alphanumeric characters, dashes (-), and underscores (_)"
        ))
    })
}
