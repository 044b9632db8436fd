use std::env;

use axum::http::StatusCode;

/// Validates the provided pharmacy API key against the expected key from
/// the environment.
///
/// The pharmacy write path (`POST /requests/{id}/quotes`) is the only
/// externally authenticated surface of this subsystem; patient-side session
/// handling is an external collaborator.
///
/// Returns `Ok(())` if the key is valid, or a status/message pair ready for
/// an axum error response if invalid or missing.
pub fn validate_api_key(provided_key: &str) -> Result<(), (StatusCode, &'static str)> {
    let expected_key = env::var("PSX_PHARMACY_API_KEY").map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "PSX_PHARMACY_API_KEY not set in environment",
        )
    })?;

    if provided_key == expected_key {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "Invalid API key"))
    }
}
