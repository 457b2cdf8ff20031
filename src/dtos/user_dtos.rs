use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::User;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ProfileStats {
    pub posts: u64,
    pub followers: u64,
    pub following: u64,
}

#[derive(Debug, Serialize)]
pub struct ProfileOut {
    pub user: User,
    pub stats: ProfileStats,
    pub is_following: bool,
    pub is_self: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileDTO {
    pub display_name: String,
}

/// Avatar upload body: base64 payload, optionally as a `data:` URL.
#[derive(Debug, Deserialize)]
pub struct UploadAvatarRequest {
    pub image_data: String,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarOut {
    pub avatar_url: String,
}

#[derive(Debug, Serialize)]
pub struct FollowOut {
    pub user_id: Uuid,
    pub following: bool,
    pub follower_count: u64,
}
