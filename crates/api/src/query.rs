//! Shared query parameter helpers for API handlers.

use venuebook_core::error::CoreError;

/// Parse an optional query value with the type's `FromStr`, so that bad
/// values surface as `VALIDATION_ERROR` rather than an extractor rejection.
pub fn parse_optional<T>(value: Option<&str>) -> Result<Option<T>, CoreError>
where
    T: std::str::FromStr<Err = CoreError>,
{
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse)
        .transpose()
}
