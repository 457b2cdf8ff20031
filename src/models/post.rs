use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_CAPTION_CHARS: usize = 2200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NewPost {
    pub user_id: Uuid,
    pub image_url: String,
    pub caption: Option<String>,
}

/// Normalises an optional caption: blank becomes `None`, otherwise it must
/// fit in `MAX_CAPTION_CHARS` characters.
pub fn validate_caption(raw: Option<&str>) -> Result<Option<String>, String> {
    let Some(caption) = raw.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    if caption.chars().count() > MAX_CAPTION_CHARS {
        return Err(format!(
            "Caption must be at most {} characters",
            MAX_CAPTION_CHARS
        ));
    }

    Ok(Some(caption.to_string()))
}
