use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Epoch seconds given as a JSON number or a numeric string.
pub fn epoch_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid epoch time '{s}'"))),
    }
}

/// Reject values longer than `max` characters.
pub fn validate_max_len(value: Option<&str>, field: &str, max: usize) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max
    {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Validate a phase name (1-100 characters after trimming).
pub fn validate_phase_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(AppError::Validation(
            "Phase name must be 1-100 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_phase_order(order: i32) -> Result<(), AppError> {
    if order < 1 {
        return Err(AppError::Validation("phase_order must be >= 1".into()));
    }
    Ok(())
}

/// Start must precede end when both are set.
pub fn validate_phase_window(start: Option<f64>, end: Option<f64>) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (start, end)
        && start >= end
    {
        return Err(AppError::Validation(
            "Phase start time must be before end time".into(),
        ));
    }
    Ok(())
}
