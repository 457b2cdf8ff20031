use serde_json::json;
use uuid::Uuid;

use crate::models::follow::Follow;
use crate::repositories::postgrest::{eq, RepoError, SupabaseRest};

const FOLLOWS: &str = "follows";

pub struct FollowRepository;

impl FollowRepository {
    pub async fn exists(rest: &SupabaseRest, follower_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError> {
        let rows: Vec<Follow> = rest
            .select(
                FOLLOWS,
                &[
                    ("follower_id", eq(follower_id)),
                    ("followee_id", eq(followee_id)),
                    ("select", "follower_id,followee_id".to_string()),
                ],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    pub async fn create(rest: &SupabaseRest, follower_id: Uuid, followee_id: Uuid) -> Result<Follow, RepoError> {
        rest.insert(
            FOLLOWS,
            &json!({ "follower_id": follower_id, "followee_id": followee_id }),
            "*",
        )
        .await
    }

    pub async fn delete(rest: &SupabaseRest, follower_id: Uuid, followee_id: Uuid) -> Result<bool, RepoError> {
        let rows: Vec<Follow> = rest
            .delete(
                FOLLOWS,
                &[("follower_id", eq(follower_id)), ("followee_id", eq(followee_id))],
            )
            .await?;
        Ok(!rows.is_empty())
    }

    pub async fn count_followers(rest: &SupabaseRest, user_id: Uuid) -> Result<u64, RepoError> {
        rest.count(FOLLOWS, "follower_id", &[("followee_id", eq(user_id))]).await
    }

    pub async fn count_following(rest: &SupabaseRest, user_id: Uuid) -> Result<u64, RepoError> {
        rest.count(FOLLOWS, "followee_id", &[("follower_id", eq(user_id))]).await
    }
}
