//! Validation helpers shared by message intake and provider value objects
//!
//! Free-function validators returning descriptive error strings; callers wrap
//! the result into their own typed errors.

/// Validate that a string field is non-empty after trimming
pub fn validate_non_empty(field_name: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", field_name));
    }
    Ok(())
}

/// Validate that a numeric value falls within an inclusive range
pub fn validate_range<T: PartialOrd + std::fmt::Display>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!(
            "{} must be between {} and {}, got {}",
            field_name, min, max, value
        ));
    }
    Ok(())
}

/// Validate an RTMP/RTMPS publish URL
///
/// Accepts only the `rtmp://` and `rtmps://` schemes and requires a
/// non-empty host component.
pub fn validate_stream_url(url: &str) -> Result<(), String> {
    let rest = url
        .strip_prefix("rtmps://")
        .or_else(|| url.strip_prefix("rtmp://"))
        .ok_or_else(|| format!("stream URL must use rtmp:// or rtmps://, got '{}'", url))?;

    let host = rest.split('/').next().unwrap_or("");
    if host.is_empty() {
        return Err(format!("stream URL '{}' has no host", url));
    }
    Ok(())
}
