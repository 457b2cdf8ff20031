// src/services/storage_service.rs - Supabase Storage uploads and removals
use log::info;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use serde_json::json;
use urlencoding::encode;

use crate::repositories::postgrest::{send_checked, RepoError, SupabaseRest};

#[derive(Clone)]
pub struct StorageService {
    client: Client,
    project_url: String,
    headers: HeaderMap,
    pub posts_bucket: String,
    pub avatars_bucket: String,
}

fn encode_path(object_path: &str) -> String {
    object_path
        .split('/')
        .map(|segment| encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl StorageService {
    pub fn new(rest: &SupabaseRest, posts_bucket: &str, avatars_bucket: &str) -> Self {
        Self {
            client: rest.client().clone(),
            project_url: rest.project_url().to_string(),
            headers: rest.headers(),
            posts_bucket: posts_bucket.to_string(),
            avatars_bucket: avatars_bucket.to_string(),
        }
    }

    pub fn public_url(&self, bucket: &str, object_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.project_url,
            bucket,
            encode_path(object_path)
        )
    }

    /// Recovers the object path from a public URL produced by `public_url`.
    pub fn object_path(&self, bucket: &str, public_url: &str) -> Option<String> {
        let prefix = format!("{}/storage/v1/object/public/{}/", self.project_url, bucket);
        let encoded = public_url.strip_prefix(&prefix)?;
        let decoded = urlencoding::decode(encoded).ok()?.into_owned();
        if decoded.is_empty() { None } else { Some(decoded) }
    }

    /// Uploads bytes and returns the object's public URL. With `upsert` an
    /// existing object at the same path is replaced.
    pub async fn upload(
        &self,
        bucket: &str,
        object_path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<String, RepoError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.project_url,
            bucket,
            encode_path(object_path)
        );

        let req = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes);

        send_checked(req).await?;
        info!("stored {}/{}", bucket, object_path);
        Ok(self.public_url(bucket, object_path))
    }

    pub async fn remove(&self, bucket: &str, object_paths: &[String]) -> Result<(), RepoError> {
        let url = format!("{}/storage/v1/object/{}", self.project_url, bucket);
        let req = self
            .client
            .delete(&url)
            .headers(self.headers.clone())
            .json(&json!({ "prefixes": object_paths }));

        send_checked(req).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(url: &str) -> StorageService {
        let rest = SupabaseRest::new(Client::new(), url, "service-key").unwrap();
        StorageService::new(&rest, "posts", "avatars")
    }

    #[test]
    fn public_url_round_trips_to_object_path() {
        let storage = service("https://proj.supabase.co");
        let url = storage.public_url("posts", "abc/my photo.jpg");
        assert_eq!(
            url,
            "https://proj.supabase.co/storage/v1/object/public/posts/abc/my%20photo.jpg"
        );
        assert_eq!(storage.object_path("posts", &url).as_deref(), Some("abc/my photo.jpg"));
    }

    #[test]
    fn foreign_urls_have_no_object_path() {
        let storage = service("https://proj.supabase.co");
        assert_eq!(storage.object_path("posts", "https://elsewhere.test/a.jpg"), None);
        assert_eq!(
            storage.object_path("avatars", "https://proj.supabase.co/storage/v1/object/public/posts/a.jpg"),
            None
        );
    }

    #[tokio::test]
    async fn upload_sends_bytes_and_returns_public_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/posts/u1/p1.jpg"))
            .and(header("content-type", "image/jpeg"))
            .and(header("x-upsert", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "posts/u1/p1.jpg" })))
            .expect(1)
            .mount(&server)
            .await;

        let storage = service(&server.uri());
        let url = storage
            .upload("posts", "u1/p1.jpg", vec![1, 2, 3], "image/jpeg", false)
            .await
            .unwrap();
        assert_eq!(url, format!("{}/storage/v1/object/public/posts/u1/p1.jpg", server.uri()));
    }

    #[tokio::test]
    async fn remove_posts_prefixes() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/posts"))
            .and(body_json(json!({ "prefixes": ["u1/p1.jpg"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        service(&server.uri())
            .remove("posts", &["u1/p1.jpg".to_string()])
            .await
            .unwrap();
    }
}
