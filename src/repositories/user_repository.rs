use serde_json::json;
use uuid::Uuid;

use crate::models::user::{NewUser, User};
use crate::repositories::postgrest::{eq, RepoError, SupabaseRest};

const USERS: &str = "users";

pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_id(rest: &SupabaseRest, user_id: Uuid) -> Result<Option<User>, RepoError> {
        let rows: Vec<User> = rest
            .select(USERS, &[("id", eq(user_id)), ("select", "*".to_string())])
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn exists(rest: &SupabaseRest, user_id: Uuid) -> Result<bool, RepoError> {
        let rows: Vec<serde_json::Value> = rest
            .select(USERS, &[("id", eq(user_id)), ("select", "id".to_string())])
            .await?;
        Ok(!rows.is_empty())
    }

    /// Insert-or-update keyed on the identity id.
    pub async fn upsert(rest: &SupabaseRest, user: &NewUser) -> Result<User, RepoError> {
        rest.upsert(USERS, "id", user).await
    }

    pub async fn update_display_name(
        rest: &SupabaseRest,
        user_id: Uuid,
        display_name: &str,
    ) -> Result<Option<User>, RepoError> {
        let rows: Vec<User> = rest
            .update(USERS, &[("id", eq(user_id))], &json!({ "display_name": display_name }))
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn update_avatar(
        rest: &SupabaseRest,
        user_id: Uuid,
        avatar_url: &str,
    ) -> Result<Option<User>, RepoError> {
        let rows: Vec<User> = rest
            .update(USERS, &[("id", eq(user_id))], &json!({ "avatar_url": avatar_url }))
            .await?;
        Ok(rows.into_iter().next())
    }
}
