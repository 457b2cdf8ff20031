use actix_web::{delete, post, web, HttpResponse};
use uuid::Uuid;

use crate::dtos::api_response::ApiResponse;
use crate::dtos::post_dtos::LikeOut;
use crate::errors::ApiError;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::repositories::like_repository::LikeRepository;
use crate::repositories::post_repository::PostRepository;
use crate::AppState;

/// POST /api/posts/{post_id}/like
#[post("/posts/{post_id}/like")]
pub async fn like_post(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let rest = &app_state.rest;

    if PostRepository::find_by_id(rest, post_id).await?.is_none() {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }
    app_state.identity.ensure_user(rest, user.user_id).await?;

    if LikeRepository::exists(rest, post_id, user.user_id).await? {
        return Err(ApiError::Conflict("Post already liked".to_string()));
    }

    // a concurrent like from the same user loses on the primary key
    LikeRepository::create(rest, post_id, user.user_id).await.map_err(|e| {
        if e.is_unique_violation() {
            ApiError::Conflict("Post already liked".to_string())
        } else if e.is_foreign_key_violation() {
            ApiError::NotFound("Post not found".to_string())
        } else {
            e.into()
        }
    })?;

    let like_count = LikeRepository::count_for_post(rest, post_id).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(
        "Post liked",
        LikeOut { post_id, liked: true, like_count },
    )))
}

/// DELETE /api/posts/{post_id}/like
#[delete("/posts/{post_id}/like")]
pub async fn unlike_post(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let rest = &app_state.rest;

    if !LikeRepository::delete(rest, post_id, user.user_id).await? {
        return Err(ApiError::NotFound("Like not found".to_string()));
    }

    let like_count = LikeRepository::count_for_post(rest, post_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Post unliked",
        LikeOut { post_id, liked: false, like_count },
    )))
}
