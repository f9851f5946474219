//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest genre accepted, both in catalog entries and as a games filter.
pub const MAX_GENRE_LENGTH: usize = 64;

/// Validates that a genre is at most [`MAX_GENRE_LENGTH`] characters and free of
/// control characters.
///
/// # Examples
///
/// ```ignore
/// validate_genre("Action")     // Ok
/// validate_genre("Act\u{0}")   // Err - control character
/// ```
pub fn validate_genre(genre: &str) -> Result<(), ValidationError> {
    let length = genre.chars().count();
    if length > MAX_GENRE_LENGTH {
        let mut err = ValidationError::new("genre_length");
        err.message = Some(
            format!("Genre must be at most {MAX_GENRE_LENGTH} characters (got {length})").into(),
        );
        return Err(err);
    }

    if genre.chars().any(char::is_control) {
        let mut err = ValidationError::new("genre_format");
        err.message = Some("Genre must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a genre as declared by a catalog entry.
///
/// On top of [`validate_genre`], a catalog genre must contain something besides
/// whitespace, since a blank filter selects the whole catalog.
pub fn validate_catalog_genre(genre: &str) -> Result<(), ValidationError> {
    if genre.trim().is_empty() {
        let mut err = ValidationError::new("genre_blank");
        err.message = Some("Genre must not be blank".into());
        return Err(err);
    }

    validate_genre(genre)
}
