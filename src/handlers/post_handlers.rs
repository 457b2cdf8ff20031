// src/handlers/post_handlers.rs - feed, post upload and post removal

use actix_multipart::{Field, Multipart};
use actix_web::{delete, get, post, web, HttpResponse};
use futures::StreamExt;
use log::{info, warn};
use uuid::Uuid;

use crate::dtos::api_response::ApiResponse;
use crate::dtos::pagination::PageQuery;
use crate::errors::ApiError;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::post::{validate_caption, NewPost};
use crate::repositories::post_repository::PostRepository;
use crate::repositories::user_repository::UserRepository;
use crate::services::feed_service;
use crate::services::image_service::{self, MAX_UPLOAD_BYTES, POST_IMAGE_SIZE};
use crate::AppState;

/// Enough bytes for 2200 four-byte characters.
const CAPTION_FIELD_LIMIT: usize = 16 * 1024;

struct PostUpload {
    image: Option<(Vec<u8>, String)>,
    caption: Option<String>,
}

async fn read_limited(field: &mut Field, limit: usize, too_large: &str) -> Result<Vec<u8>, ApiError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        if buf.len() + chunk.len() > limit {
            return Err(ApiError::Validation(too_large.to_string()));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn read_post_form(mut payload: Multipart) -> Result<PostUpload, ApiError> {
    let mut upload = PostUpload { image: None, caption: None };

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" => {
                let declared = field
                    .content_type()
                    .map(|m| m.essence_str().to_string())
                    .unwrap_or_default();
                let content_type = image_service::allowed_image_type(&declared).ok_or_else(|| {
                    ApiError::Validation("Invalid file type. Only JPEG, PNG, GIF, and WEBP are allowed.".to_string())
                })?;

                let bytes = read_limited(&mut field, MAX_UPLOAD_BYTES, "Image must be at most 5 MB").await?;
                if bytes.is_empty() {
                    return Err(ApiError::Validation("Image file is empty".to_string()));
                }
                upload.image = Some((bytes, content_type));
            }
            "caption" => {
                let bytes = read_limited(&mut field, CAPTION_FIELD_LIMIT, "Caption is too long").await?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| ApiError::Validation("Caption must be valid UTF-8".to_string()))?;
                upload.caption = Some(text);
            }
            _ => {
                while let Some(chunk) = field.next().await {
                    chunk?;
                }
            }
        }
    }

    Ok(upload)
}

/// GET /api/posts?page=&limit=
#[get("/posts")]
pub async fn list_posts(
    app_state: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = query.resolve().map_err(ApiError::Validation)?;
    let feed = feed_service::load_feed(&app_state.rest, viewer.map(|u| u.user_id), page, None).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Posts retrieved successfully", feed)))
}

/// GET /api/users/{user_id}/posts?page=&limit=
#[get("/users/{user_id}/posts")]
pub async fn list_user_posts(
    app_state: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    path: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let author_id = path.into_inner();
    let page = query.resolve().map_err(ApiError::Validation)?;

    if !UserRepository::exists(&app_state.rest, author_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let feed = feed_service::load_feed(&app_state.rest, viewer.map(|u| u.user_id), page, Some(author_id)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Posts retrieved successfully", feed)))
}

/// POST /api/posts (multipart: `image`, `caption`)
#[post("/posts")]
pub async fn create_post(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let upload = read_post_form(payload).await?;
    let (bytes, content_type) = upload
        .image
        .ok_or_else(|| ApiError::Validation("Image file is required".to_string()))?;
    let caption = validate_caption(upload.caption.as_deref()).map_err(ApiError::Validation)?;

    app_state.identity.ensure_user(&app_state.rest, user.user_id).await?;

    let prepared = image_service::prepare_upload(bytes, &content_type, POST_IMAGE_SIZE)
        .await
        .map_err(|e| ApiError::Internal(format!("image task failed: {}", e)))?;

    let storage = &app_state.storage;
    let object_path = format!("{}/{}.{}", user.user_id, Uuid::new_v4(), prepared.extension);
    let image_url = storage
        .upload(&storage.posts_bucket, &object_path, prepared.bytes, &prepared.content_type, false)
        .await?;

    let new_post = NewPost {
        user_id: user.user_id,
        image_url,
        caption,
    };

    match PostRepository::create(&app_state.rest, &new_post).await {
        Ok(post) => {
            info!("post {} created by {} (resized: {})", post.id, user.user_id, prepared.resized);
            Ok(HttpResponse::Created().json(ApiResponse::success("Post created successfully", post)))
        }
        Err(e) => {
            // the row never landed, so the uploaded object is orphaned
            if let Err(cleanup) = storage.remove(&storage.posts_bucket, &[object_path]).await {
                warn!("failed to remove orphaned upload: {}", cleanup);
            }
            Err(e.into())
        }
    }
}

/// GET /api/posts/{post_id}
#[get("/posts/{post_id}")]
pub async fn get_post(
    app_state: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let detail = feed_service::load_post_detail(&app_state.rest, post_id, viewer.map(|u| u.user_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Post retrieved successfully", detail)))
}

/// DELETE /api/posts/{post_id} - owner only
#[delete("/posts/{post_id}")]
pub async fn delete_post(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let post_id = path.into_inner();
    let post = PostRepository::find_by_id(&app_state.rest, post_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.user_id != user.user_id {
        return Err(ApiError::Forbidden("You can only delete your own posts".to_string()));
    }

    let deleted = PostRepository::delete_owned(&app_state.rest, post_id, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    let storage = &app_state.storage;
    if let Some(object_path) = storage.object_path(&storage.posts_bucket, &deleted.image_url) {
        if let Err(e) = storage.remove(&storage.posts_bucket, &[object_path]).await {
            warn!("post {} deleted but image removal failed: {}", post_id, e);
        }
    }

    info!("post {} deleted by {}", post_id, user.user_id);
    Ok(HttpResponse::Ok().json(ApiResponse::message("Post deleted successfully")))
}
