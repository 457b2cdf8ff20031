use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_COMMENT_CHARS: usize = 2200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NewComment {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

pub fn validate_content(raw: &str) -> Result<String, String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err("Comment cannot be empty".to_string());
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(format!(
            "Comment must be at most {} characters",
            MAX_COMMENT_CHARS
        ));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_and_oversized() {
        assert!(validate_content(" \t").is_err());
        assert!(validate_content(&"a".repeat(MAX_COMMENT_CHARS + 1)).is_err());
        assert_eq!(validate_content(" nice shot ").unwrap(), "nice shot");
    }
}
