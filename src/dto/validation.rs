//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest player name accepted, in characters.
pub const MAX_PLAYER_NAME_CHARS: usize = 40;

/// Validates that a player name has visible content and a sane length.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Momota")   // Ok
/// validate_player_name("   ")      // Err - blank
/// validate_player_name("a\nb")     // Err - control character
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_PLAYER_NAME_CHARS {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!("Player name must be at most {MAX_PLAYER_NAME_CHARS} characters (got {chars})")
                .into(),
        );
        return Err(err);
    }

    if trimmed.chars().any(char::is_control) {
        let mut err = ValidationError::new("player_name_format");
        err.message = Some("Player name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name_valid() {
        assert!(validate_player_name("Chen Long").is_ok());
        assert!(validate_player_name("  padded  ").is_ok());
        assert!(validate_player_name("山口").is_ok());
    }

    #[test]
    fn test_validate_player_name_blank() {
        assert!(validate_player_name("").is_err());
        assert!(validate_player_name(" \t ").is_err());
    }

    #[test]
    fn test_validate_player_name_invalid() {
        assert!(validate_player_name(&"x".repeat(41)).is_err()); // too long
        assert!(validate_player_name("line\nbreak").is_err()); // control char
    }
}
