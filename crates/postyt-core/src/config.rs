//! Configuration module
//!
//! Settings are read from the environment (with `.env` support) and validated once at startup.
//! Missing OAuth client settings for a platform are not a startup error; they surface when a
//! user tries to link an account on that platform.

use std::collections::HashMap;
use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::PathBuf;

use crate::encryption::EncryptionService;
use crate::models::PlatformId;

const DEFAULT_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_VIDEO_SIZE_MB: usize = 500;
const UPLOAD_CONCURRENCY: usize = 4;
const UPLOAD_DIR: &str = "uploads";
const OAUTH_REDIRECT_BASE_URL: &str = "http://localhost:3000";
const AUTH_SUCCESS_REDIRECT_URL: &str = "http://localhost:5173/auth/success";
const AUTH_ERROR_REDIRECT_URL: &str = "http://localhost:5173/auth/error";

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub environment: String,
}

/// OAuth client registration for one platform
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct PostytConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub encryption_key: String,
    // Upload handling
    pub upload_dir: PathBuf,
    pub max_video_size_bytes: usize,
    pub upload_concurrency: usize,
    // OAuth
    pub oauth_redirect_base_url: String,
    pub auth_success_redirect_url: String,
    pub auth_error_redirect_url: String,
    pub platform_clients: HashMap<PlatformId, OAuthClientConfig>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config(pub Box<PostytConfig>);

impl Config {
    fn inner(&self) -> &PostytConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = PostytConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn encryption_key(&self) -> &str {
        &self.inner().encryption_key
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.inner().upload_dir
    }

    pub fn max_video_size_bytes(&self) -> usize {
        self.inner().max_video_size_bytes
    }

    pub fn upload_concurrency(&self) -> usize {
        self.inner().upload_concurrency
    }

    pub fn oauth_redirect_base_url(&self) -> &str {
        &self.inner().oauth_redirect_base_url
    }

    pub fn auth_success_redirect_url(&self) -> &str {
        &self.inner().auth_success_redirect_url
    }

    pub fn auth_error_redirect_url(&self) -> &str {
        &self.inner().auth_error_redirect_url
    }

    pub fn platform_client(&self, platform: PlatformId) -> Option<&OAuthClientConfig> {
        self.inner().platform_clients.get(&platform)
    }

    /// OAuth redirect URI registered with the provider for `platform`
    pub fn redirect_uri(&self, platform: PlatformId) -> String {
        redirect_uri(&self.inner().oauth_redirect_base_url, platform)
    }
}

pub fn redirect_uri(base_url: &str, platform: PlatformId) -> String {
    format!(
        "{}/oauth/{}/callback",
        base_url.trim_end_matches('/'),
        platform.as_str()
    )
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

impl PostytConfig {
    /// Build the configuration from a key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: var("PORT")
                .unwrap_or_else(|| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: var("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
        };

        let max_video_size_mb = var("MAX_VIDEO_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_VIDEO_SIZE_MB);

        let platform_clients = PlatformId::ALL
            .into_iter()
            .filter_map(|platform| {
                let prefix = platform.env_prefix();
                let client_id = var(&format!("{}_CLIENT_ID", prefix))?;
                let client_secret = var(&format!("{}_CLIENT_SECRET", prefix))?;
                Some((
                    platform,
                    OAuthClientConfig {
                        client_id,
                        client_secret,
                    },
                ))
            })
            .collect();

        let config = PostytConfig {
            base,
            database_url: var("DATABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?,
            encryption_key: var("ENCRYPTION_KEY").ok_or_else(|| {
                anyhow::anyhow!("ENCRYPTION_KEY must be set to encrypt OAuth tokens")
            })?,
            upload_dir: PathBuf::from(var("UPLOAD_DIR").unwrap_or_else(|| UPLOAD_DIR.to_string())),
            max_video_size_bytes: max_video_size_mb * 1024 * 1024,
            upload_concurrency: var("UPLOAD_CONCURRENCY")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(UPLOAD_CONCURRENCY)
                .max(1),
            oauth_redirect_base_url: var("OAUTH_REDIRECT_BASE_URL")
                .unwrap_or_else(|| OAUTH_REDIRECT_BASE_URL.to_string()),
            auth_success_redirect_url: var("AUTH_SUCCESS_REDIRECT_URL")
                .unwrap_or_else(|| AUTH_SUCCESS_REDIRECT_URL.to_string()),
            auth_error_redirect_url: var("AUTH_ERROR_REDIRECT_URL")
                .unwrap_or_else(|| AUTH_ERROR_REDIRECT_URL.to_string()),
            platform_clients,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        EncryptionService::from_base64_key(&self.encryption_key).map_err(|e| {
            anyhow::anyhow!("ENCRYPTION_KEY must be a base64-encoded 32-byte key: {}", e)
        })?;

        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be greater than 0"));
        }

        if !self.oauth_redirect_base_url.starts_with("http://")
            && !self.oauth_redirect_base_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "OAUTH_REDIRECT_BASE_URL must be an absolute http(s) URL"
            ));
        }

        Ok(())
    }
}
