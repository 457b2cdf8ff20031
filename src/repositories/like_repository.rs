use serde_json::json;
use uuid::Uuid;

use crate::models::like::Like;
use crate::repositories::postgrest::{eq, RepoError, SupabaseRest};

const LIKES: &str = "likes";

pub struct LikeRepository;

impl LikeRepository {
    pub async fn exists(rest: &SupabaseRest, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        let rows: Vec<Like> = rest
            .select(
                LIKES,
                &[
                    ("post_id", eq(post_id)),
                    ("user_id", eq(user_id)),
                    ("select", "post_id,user_id".to_string()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    /// Fails with a unique violation if the pair already exists.
    pub async fn create(rest: &SupabaseRest, post_id: Uuid, user_id: Uuid) -> Result<Like, RepoError> {
        rest.insert(LIKES, &json!({ "post_id": post_id, "user_id": user_id }), "*")
            .await
    }

    /// Returns whether a like was removed.
    pub async fn delete(rest: &SupabaseRest, post_id: Uuid, user_id: Uuid) -> Result<bool, RepoError> {
        let rows: Vec<Like> = rest
            .delete(LIKES, &[("post_id", eq(post_id)), ("user_id", eq(user_id))])
            .await?;
        Ok(!rows.is_empty())
    }

    pub async fn count_for_post(rest: &SupabaseRest, post_id: Uuid) -> Result<u64, RepoError> {
        rest.count(LIKES, "post_id", &[("post_id", eq(post_id))]).await
    }
}
