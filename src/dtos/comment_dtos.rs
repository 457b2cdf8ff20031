use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserSummary;

#[derive(Debug, Deserialize)]
pub struct CreateCommentDTO {
    pub content: String,
}

/// Comment with its author embedded (`author:users(...)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentOut {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<UserSummary>,
}
