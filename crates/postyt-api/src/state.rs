//! Application state shared by all handlers

use postyt_core::Config;
use postyt_db::AccountStore;
use postyt_platforms::AdapterRegistry;
use postyt_services::UploadOrchestrator;
use std::path::PathBuf;
use std::sync::Arc;

/// Where uploads land and how large they may be
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
    pub max_video_size_bytes: usize,
}

/// Front-end pages the OAuth callback redirects to
#[derive(Debug, Clone)]
pub struct RedirectConfig {
    pub success_url: String,
    pub error_url: String,
}

impl RedirectConfig {
    pub fn success(&self, platform: &str) -> String {
        with_platform(&self.success_url, platform)
    }

    pub fn error(&self, platform: &str) -> String {
        with_platform(&self.error_url, platform)
    }
}

fn with_platform(url: &str, platform: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}platform={}", url, separator, platform)
}

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub registry: Arc<AdapterRegistry>,
    pub orchestrator: UploadOrchestrator,
    pub upload: UploadConfig,
    pub redirects: RedirectConfig,
}

impl AppState {
    pub fn new(config: &Config, accounts: Arc<dyn AccountStore>, registry: AdapterRegistry) -> Self {
        let registry = Arc::new(registry);
        Self {
            accounts,
            orchestrator: UploadOrchestrator::new(registry.clone(), config.upload_concurrency()),
            registry,
            upload: UploadConfig {
                upload_dir: config.upload_dir().clone(),
                max_video_size_bytes: config.max_video_size_bytes(),
            },
            redirects: RedirectConfig {
                success_url: config.auth_success_redirect_url().to_string(),
                error_url: config.auth_error_redirect_url().to_string(),
            },
        }
    }
}
