use actix_web::{delete, get, post, web, HttpResponse};
use log::info;
use uuid::Uuid;

use crate::dtos::api_response::ApiResponse;
use crate::dtos::comment_dtos::CreateCommentDTO;
use crate::errors::ApiError;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::comment::{validate_content, NewComment};
use crate::repositories::comment_repository::CommentRepository;
use crate::repositories::post_repository::PostRepository;
use crate::AppState;

async fn require_post(app_state: &AppState, post_id: Uuid) -> Result<(), ApiError> {
    match PostRepository::find_by_id(&app_state.rest, post_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("Post not found".to_string())),
    }
}

/// Deletes a comment written by `user`. With `expected_post`, a comment
/// belonging to a different post counts as missing.
async fn delete_own_comment(
    app_state: &AppState,
    user: AuthenticatedUser,
    comment_id: Uuid,
    expected_post: Option<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let comment = CommentRepository::find_by_id(&app_state.rest, comment_id)
        .await?
        .filter(|c| expected_post.is_none_or(|post_id| c.post_id == post_id))
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    if comment.user_id != user.user_id {
        return Err(ApiError::Forbidden("You can only delete your own comments".to_string()));
    }

    CommentRepository::delete_owned(&app_state.rest, comment_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    info!("comment {} deleted by {}", comment_id, user.user_id);
    Ok(HttpResponse::Ok().json(ApiResponse::message("Comment deleted successfully")))
}

/// GET /api/posts/{post_id}/comments
#[get("/posts/{post_id}/comments")]
pub async fn list_comments(
    app_state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    require_post(&app_state, post_id).await?;

    let comments = CommentRepository::list_for_post(&app_state.rest, post_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Comments retrieved successfully", comments)))
}

/// POST /api/posts/{post_id}/comments
#[post("/posts/{post_id}/comments")]
pub async fn create_comment(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<CreateCommentDTO>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let content = validate_content(&body.content).map_err(ApiError::Validation)?;

    require_post(&app_state, post_id).await?;
    app_state.identity.ensure_user(&app_state.rest, user.user_id).await?;

    let new_comment = NewComment {
        post_id,
        user_id: user.user_id,
        content,
    };
    let comment = CommentRepository::create(&app_state.rest, &new_comment)
        .await
        .map_err(|e| {
            if e.is_foreign_key_violation() {
                ApiError::NotFound("Post not found".to_string())
            } else {
                e.into()
            }
        })?;

    Ok(HttpResponse::Created().json(ApiResponse::success("Comment created successfully", comment)))
}

/// DELETE /api/posts/{post_id}/comments/{comment_id}
#[delete("/posts/{post_id}/comments/{comment_id}")]
pub async fn delete_post_comment(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, ApiError> {
    let (post_id, comment_id) = path.into_inner();
    delete_own_comment(&app_state, user, comment_id, Some(post_id)).await
}

/// DELETE /api/comments/{comment_id}
#[delete("/comments/{comment_id}")]
pub async fn delete_comment(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    delete_own_comment(&app_state, user, path.into_inner(), None).await
}
