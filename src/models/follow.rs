use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row of `follows`. The pair is unique and `follower_id <> followee_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: Uuid,
    pub followee_id: Uuid,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
