use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::dtos::comment_dtos::CommentOut;
use crate::models::user::UserSummary;

/// Post as shown in a feed: counts plus the two latest comments.
#[derive(Debug, Serialize)]
pub struct FeedPostOut {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: Option<UserSummary>,
    pub like_count: u64,
    pub comment_count: u64,
    pub liked_by_me: bool,
    pub is_own_post: bool,
    pub recent_comments: Vec<CommentOut>,
}

#[derive(Debug, Serialize)]
pub struct FeedPageOut {
    pub posts: Vec<FeedPostOut>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct PostDetailOut {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: Option<UserSummary>,
    pub like_count: u64,
    pub liked_by_me: bool,
    pub is_own_post: bool,
    pub comments: Vec<CommentOut>,
}

#[derive(Debug, Serialize)]
pub struct LikeOut {
    pub post_id: Uuid,
    pub liked: bool,
    pub like_count: u64,
}
