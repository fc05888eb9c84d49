//! Field level checks shared by the form workflows.
//!
//! Each helper either returns the coerced value or a
//! [`CareError::Validation`] naming the offending field.

use chrono::NaiveTime;

use crate::error::{CareError, CareResult};

/// Parse a temperature typed with a comma as decimal separator.
///
/// Accepts digits optionally followed by a comma and more digits ("36",
/// "36,5"). Anything else, including "36.5" and surrounding whitespace, is
/// rejected so a malformed value can never reach the store.
pub fn parse_temperature(raw: &str) -> CareResult<f64> {
    let invalid = || CareError::validation("temperature", "use a number such as 36,5");

    let (whole, fraction) = match raw.split_once(',') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (raw, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    if !all_digits(whole) || !fraction.map_or(true, all_digits) {
        return Err(invalid());
    }

    let normalised = match fraction {
        Some(fraction) => format!("{}.{}", whole, fraction),
        None => whole.to_string(),
    };
    normalised.parse::<f64>().map_err(|_| invalid())
}

/// Trimmed, non-empty text
pub fn required_text(field: &str, value: &str) -> CareResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CareError::validation(field, "is required"));
    }
    Ok(trimmed.to_string())
}

/// A caregiver picked from the selection box
pub fn selected_caregiver(value: Option<&str>) -> CareResult<String> {
    value
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| CareError::validation("caregiver", "select a caregiver"))
}

/// `value` within `min..=max`
pub fn bounded(field: &str, value: i64, min: i64, max: i64) -> CareResult<i64> {
    if value < min || value > max {
        return Err(CareError::validation(
            field,
            format!("must be between {} and {}", min, max),
        ));
    }
    Ok(value)
}

/// Time of day normalised to HH:MM, falling back to `default` when absent
pub fn time_of_day(field: &str, value: Option<&str>, default: NaiveTime) -> CareResult<String> {
    let time = match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => NaiveTime::parse_from_str(raw, "%H:%M")
            .map_err(|_| CareError::validation(field, "use the HH:MM format"))?,
        None => default,
    };
    Ok(time.format("%H:%M").to_string())
}
