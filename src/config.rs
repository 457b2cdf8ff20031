use std::env;
use anyhow::{Context, Result};

const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub supabase_url: String,
    pub service_role_key: String,
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub posts_bucket: String,
    pub avatars_bucket: String,
    pub allowed_origins: Vec<String>,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let supabase_url = env::var("SUPABASE_URL")
            .context("SUPABASE_URL not set")?
            .trim()
            .trim_end_matches('/')
            .to_string();
        let service_role_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .context("SUPABASE_SERVICE_ROLE_KEY not set")?
            .trim()
            .to_string();
        let jwt_secret = env::var("SUPABASE_JWT_SECRET")
            .context("SUPABASE_JWT_SECRET not set")?
            .trim()
            .to_string();

        let port = match env::var("PORT") {
            Ok(p) => p.trim().parse().with_context(|| format!("PORT is not a valid port: {p}"))?,
            Err(_) => 8080,
        };

        Ok(Self {
            supabase_url,
            service_role_key,
            jwt_secret,
            jwt_audience: var_or("SUPABASE_JWT_AUDIENCE", "authenticated"),
            posts_bucket: var_or("POSTS_BUCKET", "posts"),
            avatars_bucket: var_or("AVATARS_BUCKET", "avatars"),
            allowed_origins: parse_origins(&var_or("ALLOWED_ORIGINS", DEFAULT_ORIGINS)),
            port,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_empty_entries_dropped() {
        let origins = parse_origins(" http://a.test , ,http://b.test,");
        assert_eq!(origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn default_origins_cover_local_dev() {
        let origins = parse_origins(DEFAULT_ORIGINS);
        assert_eq!(origins.len(), 2);
        assert!(origins.contains(&"http://localhost:3000".to_string()));
    }
}
