pub mod api_response;
pub mod comment_dtos;
pub mod pagination;
pub mod post_dtos;
pub mod user_dtos;
