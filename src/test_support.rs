//! Shared fixtures for handler tests: app state pointed at a mock Supabase,
//! token minting, and canned PostgREST rows.
use actix_web::web;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::Settings;
use crate::AppState;

pub const JWT_SECRET: &str = "test-jwt-secret-with-enough-entropy";
pub const CREATED_AT: &str = "2024-05-01T12:00:00+00:00";

pub fn settings(supabase_url: &str) -> Settings {
    Settings {
        supabase_url: supabase_url.to_string(),
        service_role_key: "service-role-key".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_audience: "authenticated".to_string(),
        posts_bucket: "posts".to_string(),
        avatars_bucket: "avatars".to_string(),
        allowed_origins: vec![],
        port: 0,
    }
}

pub fn test_state(supabase_url: &str) -> web::Data<AppState> {
    let state = AppState::from_settings(&settings(supabase_url), Client::new()).unwrap();
    web::Data::new(state)
}

pub fn bearer_for(user_id: Uuid) -> String {
    let exp = chrono::Utc::now().timestamp() + 3600;
    let token = encode(
        &Header::default(),
        &json!({ "sub": user_id, "aud": "authenticated", "role": "authenticated", "exp": exp }),
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

pub fn user_row(id: Uuid, name: &str) -> Value {
    json!({ "id": id, "display_name": name, "avatar_url": null, "created_at": CREATED_AT })
}

pub fn post_row(id: Uuid, user_id: Uuid) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "image_url": format!("https://cdn.test/{}.jpg", id),
        "caption": "sunset",
        "created_at": CREATED_AT
    })
}

pub fn post_with_author_row(id: Uuid, user_id: Uuid) -> Value {
    let mut row = post_row(id, user_id);
    row["author"] = json!({ "id": user_id, "display_name": "author", "avatar_url": null });
    row
}

/// `users?id=eq.<id>` returns one row, so writes skip identity sync.
pub async fn mount_user_exists(server: &MockServer, user_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user_row(user_id, "someone")])))
        .mount(server)
        .await;
}

pub async fn mount_post(server: &MockServer, post_id: Uuid, owner_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .and(query_param("id", format!("eq.{}", post_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_row(post_id, owner_id)])))
        .mount(server)
        .await;
}

pub async fn mount_missing_post(server: &MockServer, post_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .and(query_param("id", format!("eq.{}", post_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

/// Any counted select on `table` reports `total` rows.
pub async fn mount_count(server: &MockServer, table: &str, total: u64) {
    let range = if total == 0 { "*/0".to_string() } else { format!("0-0/{}", total) };
    Mock::given(method("GET"))
        .and(path(format!("/rest/v1/{}", table)))
        .and(query_param("limit", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", range.as_str())
                .set_body_json(json!([])),
        )
        .mount(server)
        .await;
}

pub fn unique_violation() -> ResponseTemplate {
    ResponseTemplate::new(409).set_body_json(json!({
        "code": "23505",
        "details": null,
        "hint": null,
        "message": "duplicate key value violates unique constraint"
    }))
}
