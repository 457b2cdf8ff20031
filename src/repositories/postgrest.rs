// src/repositories/postgrest.rs - service-role client for Supabase PostgREST
use std::fmt::Display;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

static CONTENT_RANGE_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+-\d+|\*)/(\d+)$").expect("content-range pattern"));

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("supabase error: {status} -> {message}")]
    Supabase {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("other: {0}")]
    Other(String),
}

impl RepoError {
    pub fn is_unique_violation(&self) -> bool {
        self.pg_code() == Some(UNIQUE_VIOLATION)
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.pg_code() == Some(FOREIGN_KEY_VIOLATION)
    }

    fn pg_code(&self) -> Option<&str> {
        match self {
            RepoError::Supabase { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Error body returned by PostgREST and the storage API.
#[derive(Deserialize, Default)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error: Option<String>,
}

/// `eq.<value>` filter.
pub fn eq(value: impl Display) -> String {
    format!("eq.{}", value)
}

/// Pulls the total row count out of a `Content-Range` header (`0-9/42`, `*/0`).
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    CONTENT_RANGE_TOTAL
        .captures(header.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Builds the headers every service-role request carries.
pub fn service_headers(service_role_key: &str) -> Result<HeaderMap, RepoError> {
    let key = HeaderValue::from_str(service_role_key)
        .map_err(|_| RepoError::Config("service role key is not a valid header value".into()))?;
    let bearer = HeaderValue::from_str(&format!("Bearer {}", service_role_key))
        .map_err(|_| RepoError::Config("service role key is not a valid header value".into()))?;

    let mut headers = HeaderMap::new();
    headers.insert("apikey", key);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

/// Sends a request and returns the response headers and body, or the
/// PostgREST error for non-2xx responses.
pub async fn send_checked(req: RequestBuilder) -> Result<(HeaderMap, String), RepoError> {
    let resp = req.send().await?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let text = resp.text().await?;

    if !status.is_success() {
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body
            .message
            .or(body.msg)
            .or(body.error)
            .unwrap_or_else(|| text.clone());
        return Err(RepoError::Supabase {
            status: status.as_u16(),
            code: body.code,
            message,
        });
    }

    Ok((headers, text))
}

/// Thin PostgREST client. Rows come back as JSON arrays; mutations ask for
/// `return=representation` so callers get the stored rows.
#[derive(Clone)]
pub struct SupabaseRest {
    client: Client,
    project_url: String,
    headers: HeaderMap,
}

impl SupabaseRest {
    pub fn new(client: Client, supabase_url: &str, service_role_key: &str) -> Result<Self, RepoError> {
        let project_url = supabase_url
            .trim()
            .trim_end_matches('/')
            .trim_end_matches("/rest/v1")
            .to_string();

        Ok(Self {
            client,
            project_url,
            headers: service_headers(service_role_key)?,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn project_url(&self) -> &str {
        &self.project_url
    }

    pub fn headers(&self) -> HeaderMap {
        self.headers.clone()
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.project_url, table)
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, RepoError> {
        debug!("select {} {:?}", table, query);
        let req = self
            .client
            .get(self.table_url(table))
            .headers(self.headers())
            .query(query);

        let (_, body) = send_checked(req).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Select with `count=exact`; returns the rows and the total matching rows.
    pub async fn select_counted<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<(Vec<T>, u64), RepoError> {
        debug!("select (counted) {} {:?}", table, query);
        let req = self
            .client
            .get(self.table_url(table))
            .headers(self.headers())
            .header("Prefer", "count=exact")
            .query(query);

        let (headers, body) = send_checked(req).await?;
        let rows: Vec<T> = serde_json::from_str(&body)?;
        let total = headers
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .unwrap_or(rows.len() as u64);

        Ok((rows, total))
    }

    /// Exact row count for the given filters.
    pub async fn count(&self, table: &str, column: &str, filters: &[(&str, String)]) -> Result<u64, RepoError> {
        let mut query: Vec<(&str, String)> = filters.to_vec();
        query.push(("select", column.to_string()));
        query.push(("limit", "1".to_string()));

        let (_, total) = self.select_counted::<serde_json::Value>(table, &query).await?;
        Ok(total)
    }

    pub async fn insert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
        select: &str,
    ) -> Result<T, RepoError> {
        let req = self
            .client
            .post(self.table_url(table))
            .headers(self.headers())
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .query(&[("select", select)])
            .json(body);

        let (_, text) = send_checked(req).await?;
        first_row(&text, table)
    }

    pub async fn upsert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        on_conflict: &str,
        body: &B,
    ) -> Result<T, RepoError> {
        let req = self
            .client
            .post(self.table_url(table))
            .headers(self.headers())
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .query(&[("on_conflict", on_conflict)])
            .json(body);

        let (_, text) = send_checked(req).await?;
        first_row(&text, table)
    }

    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> Result<Vec<T>, RepoError> {
        let req = self
            .client
            .patch(self.table_url(table))
            .headers(self.headers())
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .query(filters)
            .json(body);

        let (_, text) = send_checked(req).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Deletes matching rows and returns them; an empty vec means nothing matched.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, RepoError> {
        let req = self
            .client
            .delete(self.table_url(table))
            .headers(self.headers())
            .header("Prefer", "return=representation")
            .query(filters);

        let (_, text) = send_checked(req).await?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn first_row<T: DeserializeOwned>(text: &str, table: &str) -> Result<T, RepoError> {
    let rows: Vec<T> = serde_json::from_str(text)?;
    rows.into_iter()
        .next()
        .ok_or_else(|| RepoError::Other(format!("empty representation from {}", table)))
}
