// src/main.rs
mod config;
mod dtos;
mod errors;
mod handlers;
mod middleware;
mod models;
mod repositories;
mod services;
#[cfg(test)]
mod test_support;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::{error, info};
use reqwest::Client;

use crate::config::Settings;
use crate::middleware::auth_extractor::TokenVerifier;
use crate::repositories::postgrest::SupabaseRest;
use crate::services::identity_service::IdentityService;
use crate::services::storage_service::StorageService;

fn mask_key(k: &str) -> String {
    let chars: Vec<char> = k.chars().collect();
    if chars.len() <= 8 { return "[REDACTED]".to_string(); }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Shared per-process state; everything in it is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub rest: SupabaseRest,
    pub identity: IdentityService,
    pub storage: StorageService,
    pub tokens: TokenVerifier,
}

impl AppState {
    pub fn from_settings(settings: &Settings, http_client: Client) -> anyhow::Result<Self> {
        let rest = SupabaseRest::new(http_client, &settings.supabase_url, &settings.service_role_key)
            .context("failed to build supabase client")?;

        Ok(Self {
            identity: IdentityService::new(&rest),
            storage: StorageService::new(&rest, &settings.posts_bucket, &settings.avatars_bucket),
            tokens: TokenVerifier::new(&settings.jwt_secret, &settings.jwt_audience),
            rest,
        })
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    info!("Supabase URL: {}", settings.supabase_url);
    info!("Supabase Key: {}", mask_key(&settings.service_role_key));

    let http_client = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(std::io::Error::other)?;

    let state = match AppState::from_settings(&settings, http_client) {
        Ok(s) => web::Data::new(s),
        Err(e) => {
            error!("Failed to initialise application state: {:#}", e);
            std::process::exit(1);
        }
    };

    let allowed_origins = settings.allowed_origins.clone();
    let bind_address = settings.bind_address();
    info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                "authorization",
                "content-type",
                "accept",
                "x-requested-with",
            ])
            .supports_credentials()
            .max_age(3600);

        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(&bind_address)?
    .run()
    .await
}
