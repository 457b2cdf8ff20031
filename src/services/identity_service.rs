// src/services/identity_service.rs - identity provider (Supabase Auth) lookups and user sync
use log::{debug, info};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::{NewUser, User, MAX_DISPLAY_NAME_CHARS};
use crate::repositories::postgrest::{RepoError, SupabaseRest};
use crate::repositories::user_repository::UserRepository;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("identity provider error: {0}")]
    Provider(String),
    #[error("identity not found")]
    UnknownIdentity,
    #[error("repository error: {0}")]
    Repo(#[from] RepoError),
}

#[derive(Debug, Default, Deserialize)]
pub struct IdentityMetadata {
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub user_name: Option<String>,
    pub avatar_url: Option<String>,
    pub picture: Option<String>,
}

/// Identity record as returned by `GET /auth/v1/admin/users/{id}`.
#[derive(Debug, Deserialize)]
pub struct IdentityRecord {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: IdentityMetadata,
}

impl IdentityRecord {
    /// Best available human name: profile metadata, then the email's local part.
    pub fn display_name(&self) -> String {
        let meta = &self.user_metadata;
        let candidate = [&meta.full_name, &meta.name, &meta.user_name]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "user".to_string());

        candidate.chars().take(MAX_DISPLAY_NAME_CHARS).collect()
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.user_metadata
            .avatar_url
            .clone()
            .or_else(|| self.user_metadata.picture.clone())
            .filter(|u| !u.trim().is_empty())
    }
}

#[derive(Clone)]
pub struct IdentityService {
    client: Client,
    project_url: String,
    headers: HeaderMap,
}

impl IdentityService {
    pub fn new(rest: &SupabaseRest) -> Self {
        Self {
            client: rest.client().clone(),
            project_url: rest.project_url().to_string(),
            headers: rest.headers(),
        }
    }

    pub async fn fetch_identity(&self, user_id: Uuid) -> Result<IdentityRecord, IdentityError> {
        let url = format!("{}/auth/v1/admin/users/{}", self.project_url, user_id);

        let resp = self
            .client
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(IdentityError::UnknownIdentity);
        }

        let text = resp.text().await?;
        if !status.is_success() {
            return Err(IdentityError::Provider(format!("{} -> {}", status.as_u16(), text)));
        }

        serde_json::from_str(&text)
            .map_err(|e| IdentityError::Provider(format!("invalid identity record: {}", e)))
    }

    /// Pulls the identity record and upserts the local `users` row for it.
    pub async fn sync_user(&self, rest: &SupabaseRest, user_id: Uuid) -> Result<User, IdentityError> {
        let identity = self.fetch_identity(user_id).await?;
        let new_user = NewUser {
            id: identity.id,
            display_name: identity.display_name(),
            avatar_url: identity.avatar_url(),
        };

        let user = UserRepository::upsert(rest, &new_user).await?;
        info!("synced user {} from identity provider", user.id);
        Ok(user)
    }

    /// Makes sure a local row exists before writes that reference it.
    pub async fn ensure_user(&self, rest: &SupabaseRest, user_id: Uuid) -> Result<(), IdentityError> {
        if UserRepository::exists(rest, user_id).await? {
            return Ok(());
        }
        debug!("no local row for {}, syncing", user_id);
        self.sync_user(rest, user_id).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(value: serde_json::Value) -> IdentityRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn display_name_prefers_metadata() {
        let r = record(json!({
            "id": Uuid::nil(),
            "email": "ana@example.com",
            "user_metadata": { "full_name": "  ", "name": "Ana Lima" }
        }));
        assert_eq!(r.display_name(), "Ana Lima");
    }

    #[test]
    fn display_name_falls_back_to_email_then_default() {
        let r = record(json!({ "id": Uuid::nil(), "email": "ana@example.com" }));
        assert_eq!(r.display_name(), "ana");

        let r = record(json!({ "id": Uuid::nil(), "email": null, "user_metadata": {} }));
        assert_eq!(r.display_name(), "user");
    }

    #[test]
    fn avatar_falls_back_to_picture() {
        let r = record(json!({
            "id": Uuid::nil(),
            "user_metadata": { "picture": "https://cdn.test/a.png" }
        }));
        assert_eq!(r.avatar_url().as_deref(), Some("https://cdn.test/a.png"));
    }

    #[tokio::test]
    async fn sync_user_upserts_identity() {
        let server = MockServer::start().await;
        let id = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path(format!("/auth/v1/admin/users/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "email": "bo@example.com",
                "user_metadata": { "avatar_url": "https://cdn.test/bo.png" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/users"))
            .and(query_param("on_conflict", "id"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
                "id": id,
                "display_name": "bo",
                "avatar_url": "https://cdn.test/bo.png",
                "created_at": "2024-05-01T10:00:00+00:00"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let rest = SupabaseRest::new(Client::new(), &server.uri(), "service-key").unwrap();
        let identity = IdentityService::new(&rest);
        let user = identity.sync_user(&rest, id).await.unwrap();

        assert_eq!(user.id, id);
        assert_eq!(user.display_name, "bo");
    }

    #[tokio::test]
    async fn unknown_identity_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "msg": "User not found" })))
            .mount(&server)
            .await;

        let rest = SupabaseRest::new(Client::new(), &server.uri(), "service-key").unwrap();
        let err = IdentityService::new(&rest)
            .fetch_identity(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::UnknownIdentity));
    }
}
