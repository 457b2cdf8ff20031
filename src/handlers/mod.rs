pub mod comment_handlers;
pub mod follow_handlers;
pub mod like_handlers;
pub mod post_handlers;
pub mod user_handlers;

use actix_web::{get, web, HttpResponse};

use crate::dtos::api_response::ApiResponse;
use crate::errors::ApiError;

/// Base64 avatars can be larger than actix's default JSON limit.
const JSON_LIMIT_BYTES: usize = 8 * 1024 * 1024;

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::message("ok"))
}

/// Registers every route plus extractor error handlers that render the
/// standard error envelope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT_BYTES)
            .error_handler(|err, _req| ApiError::Validation(format!("Invalid JSON body: {}", err)).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|_err, _req| ApiError::NotFound("Resource not found".to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::Validation(format!("Invalid query: {}", err)).into()),
    )
    .service(health)
    .service(
        web::scope("/api")
            // users: `me` routes come before `{user_id}`
            .service(user_handlers::get_me)
            .service(user_handlers::update_me)
            .service(user_handlers::upload_avatar)
            .service(user_handlers::get_profile)
            .service(post_handlers::list_user_posts)
            .service(follow_handlers::follow_user)
            .service(follow_handlers::unfollow_user)
            // posts
            .service(post_handlers::list_posts)
            .service(post_handlers::create_post)
            .service(post_handlers::get_post)
            .service(post_handlers::delete_post)
            // likes
            .service(like_handlers::like_post)
            .service(like_handlers::unlike_post)
            // comments
            .service(comment_handlers::list_comments)
            .service(comment_handlers::create_comment)
            .service(comment_handlers::delete_post_comment)
            .service(comment_handlers::delete_comment),
    );
}
