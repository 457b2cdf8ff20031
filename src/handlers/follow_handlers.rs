use actix_web::{delete, post, web, HttpResponse};
use log::info;
use uuid::Uuid;

use crate::dtos::api_response::ApiResponse;
use crate::dtos::user_dtos::FollowOut;
use crate::errors::ApiError;
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::repositories::follow_repository::FollowRepository;
use crate::repositories::user_repository::UserRepository;
use crate::AppState;

/// POST /api/users/{user_id}/follow
#[post("/users/{user_id}/follow")]
pub async fn follow_user(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let target = path.into_inner();
    let rest = &app_state.rest;

    if target == user.user_id {
        return Err(ApiError::Validation("You cannot follow yourself".to_string()));
    }
    if !UserRepository::exists(rest, target).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    app_state.identity.ensure_user(rest, user.user_id).await?;

    if FollowRepository::exists(rest, user.user_id, target).await? {
        return Err(ApiError::Conflict("Already following this user".to_string()));
    }

    FollowRepository::create(rest, user.user_id, target).await.map_err(|e| {
        if e.is_unique_violation() {
            ApiError::Conflict("Already following this user".to_string())
        } else if e.is_foreign_key_violation() {
            ApiError::NotFound("User not found".to_string())
        } else {
            e.into()
        }
    })?;
    info!("{} now follows {}", user.user_id, target);

    let follower_count = FollowRepository::count_followers(rest, target).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success(
        "User followed",
        FollowOut { user_id: target, following: true, follower_count },
    )))
}

/// DELETE /api/users/{user_id}/follow
#[delete("/users/{user_id}/follow")]
pub async fn unfollow_user(
    app_state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let target = path.into_inner();
    let rest = &app_state.rest;

    if target == user.user_id {
        return Err(ApiError::Validation("You cannot unfollow yourself".to_string()));
    }
    if !FollowRepository::delete(rest, user.user_id, target).await? {
        return Err(ApiError::NotFound("You are not following this user".to_string()));
    }

    let follower_count = FollowRepository::count_followers(rest, target).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "User unfollowed",
        FollowOut { user_id: target, following: false, follower_count },
    )))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use actix_web::{test, App};
    use serde_json::{json, Value};
    use uuid::Uuid;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_follow_rows(server: &MockServer, rows: Value) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/follows"))
            .and(query_param("select", "follower_id,followee_id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(rows))
            .mount(server)
            .await;
    }

    #[actix_web::test]
    async fn following_yourself_is_400() {
        let app = test::init_service(
            App::new().app_data(test_state("http://127.0.0.1:9")).configure(crate::handlers::configure),
        )
        .await;
        let me = Uuid::new_v4();
        for req in [
            test::TestRequest::post(),
            test::TestRequest::delete(),
        ] {
            let req = req
                .uri(&format!("/api/users/{}/follow", me))
                .insert_header(("Authorization", bearer_for(me)))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), 400);
        }
    }

    #[actix_web::test]
    async fn following_unknown_user_is_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let app = test::init_service(
            App::new().app_data(test_state(&server.uri())).configure(crate::handlers::configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri(&format!("/api/users/{}/follow", Uuid::new_v4()))
            .insert_header(("Authorization", bearer_for(Uuid::new_v4())))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }

    #[actix_web::test]
    async fn follow_returns_follower_count() {
        let server = MockServer::start().await;
        let (me, target) = (Uuid::new_v4(), Uuid::new_v4());
        mount_user_exists(&server, me).await;
        mount_user_exists(&server, target).await;
        mount_follow_rows(&server, json!([])).await;
        mount_count(&server, "follows", 7).await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/follows"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "follower_id": me, "followee_id": target, "created_at": CREATED_AT
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let app = test::init_service(
            App::new().app_data(test_state(&server.uri())).configure(crate::handlers::configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri(&format!("/api/users/{}/follow", target))
            .insert_header(("Authorization", bearer_for(me)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["following"], true);
        assert_eq!(body["data"]["follower_count"], 7);
        assert_eq!(body["data"]["user_id"], target.to_string());
    }

    #[actix_web::test]
    async fn duplicate_follow_is_409() {
        let server = MockServer::start().await;
        let (me, target) = (Uuid::new_v4(), Uuid::new_v4());
        mount_user_exists(&server, me).await;
        mount_user_exists(&server, target).await;
        mount_follow_rows(&server, json!([{ "follower_id": me, "followee_id": target }])).await;

        let app = test::init_service(
            App::new().app_data(test_state(&server.uri())).configure(crate::handlers::configure),
        )
        .await;
        let req = test::TestRequest::post()
            .uri(&format!("/api/users/{}/follow", target))
            .insert_header(("Authorization", bearer_for(me)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 409);
    }

    #[actix_web::test]
    async fn unfollow_when_not_following_is_404() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/follows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let app = test::init_service(
            App::new().app_data(test_state(&server.uri())).configure(crate::handlers::configure),
        )
        .await;
        let req = test::TestRequest::delete()
            .uri(&format!("/api/users/{}/follow", Uuid::new_v4()))
            .insert_header(("Authorization", bearer_for(Uuid::new_v4())))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}
