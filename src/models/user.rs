use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_DISPLAY_NAME_CHARS: usize = 50;

/// Row of the `users` table. `id` is the identity provider's subject id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload for the identity-sync upsert (keyed on `id`).
#[derive(Debug, Serialize)]
pub struct NewUser {
    pub id: Uuid,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Author fields embedded into posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: Uuid,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Trims and checks a display name; returns the trimmed value.
pub fn validate_display_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("Display name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_DISPLAY_NAME_CHARS {
        return Err(format!(
            "Display name must be at most {} characters",
            MAX_DISPLAY_NAME_CHARS
        ));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_trimmed() {
        assert_eq!(validate_display_name("  ana  ").unwrap(), "ana");
    }

    #[test]
    fn display_name_bounds() {
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"x".repeat(50)).is_ok());
        assert!(validate_display_name(&"x".repeat(51)).is_err());
    }
}
