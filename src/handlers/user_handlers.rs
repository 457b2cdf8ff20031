use actix_web::{get, put, web, HttpResponse};
use base64::{engine::general_purpose, Engine as _};
use log::{info, warn};
use uuid::Uuid;

use crate::dtos::api_response::ApiResponse;
use crate::dtos::user_dtos::{AvatarOut, UpdateProfileDTO, UploadAvatarRequest};
use crate::errors::ApiError;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::user::validate_display_name;
use crate::repositories::user_repository::UserRepository;
use crate::services::image_service::{self, AVATAR_IMAGE_SIZE, MAX_UPLOAD_BYTES};
use crate::services::profile_service;
use crate::AppState;

/// Accepts raw base64 or a `data:<type>;base64,<payload>` URL.
fn decode_image_data(image_data: &str) -> Result<Vec<u8>, ApiError> {
    let payload = match image_data.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => image_data,
    };
    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|_| ApiError::Validation("Invalid base64 image data".to_string()))
}

/// GET /api/users/me
#[get("/users/me")]
pub async fn get_me(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let rest = &app_state.rest;
    let me = match UserRepository::find_by_id(rest, user.user_id).await? {
        Some(row) => row,
        None => app_state.identity.sync_user(rest, user.user_id).await?,
    };

    let profile = profile_service::profile_for(rest, me, Some(user.user_id)).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Profile retrieved successfully", profile)))
}

/// PUT /api/users/me
#[put("/users/me")]
pub async fn update_me(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<UpdateProfileDTO>,
) -> Result<HttpResponse, ApiError> {
    let display_name = validate_display_name(&body.display_name).map_err(ApiError::Validation)?;
    let rest = &app_state.rest;

    app_state.identity.ensure_user(rest, user.user_id).await?;
    let updated = UserRepository::update_display_name(rest, user.user_id, &display_name)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Profile updated successfully", updated)))
}

/// PUT /api/users/me/avatar
#[put("/users/me/avatar")]
pub async fn upload_avatar(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<UploadAvatarRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let content_type = image_service::allowed_image_type(&body.content_type).ok_or_else(|| {
        ApiError::Validation("Invalid file type. Only JPEG, PNG, GIF, and WEBP are allowed.".to_string())
    })?;

    let bytes = decode_image_data(&body.image_data)?;
    if bytes.is_empty() {
        return Err(ApiError::Validation("Image data is empty".to_string()));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::Validation("Image must be at most 5 MB".to_string()));
    }

    let rest = &app_state.rest;
    let storage = &app_state.storage;
    app_state.identity.ensure_user(rest, user.user_id).await?;
    let previous = UserRepository::find_by_id(rest, user.user_id)
        .await?
        .and_then(|u| u.avatar_url);

    let prepared = image_service::prepare_upload(bytes, &content_type, AVATAR_IMAGE_SIZE)
        .await
        .map_err(|e| ApiError::Internal(format!("image processing task failed: {}", e)))?;

    let object_path = format!("{}/{}.{}", user.user_id, Uuid::new_v4(), prepared.extension);
    let avatar_url = storage
        .upload(&storage.avatars_bucket, &object_path, prepared.bytes, &prepared.content_type, true)
        .await?;

    UserRepository::update_avatar(rest, user.user_id, &avatar_url)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    info!("avatar updated for {} (resized: {})", user.user_id, prepared.resized);

    if let Some(old_path) = previous.and_then(|url| storage.object_path(&storage.avatars_bucket, &url)) {
        if let Err(e) = storage.remove(&storage.avatars_bucket, &[old_path]).await {
            warn!("failed to remove previous avatar of {}: {}", user.user_id, e);
        }
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Avatar uploaded successfully",
        AvatarOut { avatar_url },
    )))
}

/// GET /api/users/{user_id}
#[get("/users/{user_id}")]
pub async fn get_profile(
    app_state: web::Data<AppState>,
    viewer: Option<AuthenticatedUser>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let user_id = path.into_inner();
    let viewer = viewer.map(|v| v.user_id);

    let profile = profile_service::load_profile(&app_state.rest, user_id, viewer)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Profile retrieved successfully", profile)))
}

#[cfg(test)]
mod decode_tests {
    use super::*;

    #[test]
    fn decodes_plain_and_data_url_base64() {
        assert_eq!(decode_image_data("aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_image_data("data:image/png;base64,aGVsbG8=").unwrap(), b"hello");
        assert!(matches!(decode_image_data("not base64!"), Err(ApiError::Validation(_))));
    }
}
