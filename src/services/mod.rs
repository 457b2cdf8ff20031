pub mod feed_service;
pub mod identity_service;
pub mod image_service;
pub mod profile_service;
pub mod storage_service;
