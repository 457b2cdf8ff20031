pub mod comment_repository;
pub mod follow_repository;
pub mod like_repository;
pub mod post_repository;
pub mod postgrest;
pub mod user_repository;
