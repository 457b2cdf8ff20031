// src/repositories/post_repository.rs - posts with the author joined from users

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::post::{NewPost, Post};
use crate::models::user::UserSummary;
use crate::repositories::postgrest::{eq, RepoError, SupabaseRest};

const POSTS: &str = "posts";
const POST_WITH_AUTHOR: &str =
    "id,user_id,image_url,caption,created_at,author:users!posts_user_id_fkey(id,display_name,avatar_url)";

pub struct PostRepository;

#[derive(Deserialize, Debug, Clone)]
pub struct PostWithAuthor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author: Option<UserSummary>,
}

impl PostRepository {
    /// One page of posts, newest first, plus the total number of matching posts.
    pub async fn list_page(
        rest: &SupabaseRest,
        author_id: Option<Uuid>,
        offset: u64,
        limit: u32,
    ) -> Result<(Vec<PostWithAuthor>, u64), RepoError> {
        let mut query = vec![
            ("select", POST_WITH_AUTHOR.to_string()),
            ("order", "created_at.desc,id.desc".to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(author_id) = author_id {
            query.push(("user_id", eq(author_id)));
        }

        rest.select_counted(POSTS, &query).await
    }

    pub async fn find_with_author(
        rest: &SupabaseRest,
        post_id: Uuid,
    ) -> Result<Option<PostWithAuthor>, RepoError> {
        let rows: Vec<PostWithAuthor> = rest
            .select(POSTS, &[("id", eq(post_id)), ("select", POST_WITH_AUTHOR.to_string())])
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn find_by_id(rest: &SupabaseRest, post_id: Uuid) -> Result<Option<Post>, RepoError> {
        let rows: Vec<Post> = rest
            .select(POSTS, &[("id", eq(post_id)), ("select", "*".to_string())])
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn create(rest: &SupabaseRest, post: &NewPost) -> Result<Post, RepoError> {
        rest.insert(POSTS, post, "*").await
    }

    /// Deletes the post only if `owner_id` owns it; likes and comments go
    /// with it through the schema's cascade.
    pub async fn delete_owned(
        rest: &SupabaseRest,
        post_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Post>, RepoError> {
        let rows: Vec<Post> = rest
            .delete(POSTS, &[("id", eq(post_id)), ("user_id", eq(owner_id))])
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn count_by_user(rest: &SupabaseRest, user_id: Uuid) -> Result<u64, RepoError> {
        rest.count(POSTS, "id", &[("user_id", eq(user_id))]).await
    }
}
