use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row of `likes`; `(post_id, user_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub post_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
