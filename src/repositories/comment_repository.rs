use uuid::Uuid;

use crate::dtos::comment_dtos::CommentOut;
use crate::models::comment::{Comment, NewComment};
use crate::repositories::postgrest::{eq, RepoError, SupabaseRest};

const COMMENTS: &str = "comments";
const COMMENT_WITH_AUTHOR: &str =
    "id,post_id,user_id,content,created_at,author:users!comments_user_id_fkey(id,display_name,avatar_url)";

pub struct CommentRepository;

impl CommentRepository {
    /// Comments of one post, oldest first.
    pub async fn list_for_post(rest: &SupabaseRest, post_id: Uuid) -> Result<Vec<CommentOut>, RepoError> {
        rest.select(
            COMMENTS,
            &[
                ("post_id", eq(post_id)),
                ("select", COMMENT_WITH_AUTHOR.to_string()),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    /// The `limit` newest comments of one post, newest first.
    pub async fn list_recent(
        rest: &SupabaseRest,
        post_id: Uuid,
        limit: usize,
    ) -> Result<Vec<CommentOut>, RepoError> {
        rest.select(
            COMMENTS,
            &[
                ("post_id", eq(post_id)),
                ("select", COMMENT_WITH_AUTHOR.to_string()),
                ("order", "created_at.desc,id.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    pub async fn count_for_post(rest: &SupabaseRest, post_id: Uuid) -> Result<u64, RepoError> {
        rest.count(COMMENTS, "id", &[("post_id", eq(post_id))]).await
    }

    pub async fn find_by_id(rest: &SupabaseRest, comment_id: Uuid) -> Result<Option<Comment>, RepoError> {
        let rows: Vec<Comment> = rest
            .select(COMMENTS, &[("id", eq(comment_id)), ("select", "*".to_string())])
            .await?;
        Ok(rows.into_iter().next())
    }

    pub async fn create(rest: &SupabaseRest, comment: &NewComment) -> Result<CommentOut, RepoError> {
        rest.insert(COMMENTS, comment, COMMENT_WITH_AUTHOR).await
    }

    pub async fn delete_owned(
        rest: &SupabaseRest,
        comment_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<Comment>, RepoError> {
        let rows: Vec<Comment> = rest
            .delete(COMMENTS, &[("id", eq(comment_id)), ("user_id", eq(author_id))])
            .await?;
        Ok(rows.into_iter().next())
    }
}
