//! Static registry mapping every platform to its adapter
//!
//! The registry is total over `PlatformId`: a platform without an adapter is held as an
//! explicit `Unimplemented` slot rather than a missing entry, and strings outside the
//! platform set resolve to `Unsupported`. There is no default adapter.

use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use postyt_core::{Config, PlatformId};

use crate::adapter::PlatformAdapter;
use crate::error::PlatformError;

const USER_AGENT: &str = concat!("postyt/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
// Large uploads can take a long time on slow links
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Clone)]
pub enum AdapterSlot {
    Ready(Arc<dyn PlatformAdapter>),
    Unimplemented,
}

/// Result of looking a selection key up in the registry
#[derive(Clone)]
pub enum AdapterLookup {
    /// Not one of the known platform names
    Unsupported,
    /// Known platform without an adapter
    Unimplemented(PlatformId),
    Ready(Arc<dyn PlatformAdapter>),
}

#[derive(Clone)]
pub struct AdapterRegistry {
    slots: HashMap<PlatformId, AdapterSlot>,
}

impl AdapterRegistry {
    /// Create a registry where every platform is unimplemented
    pub fn new() -> Self {
        Self {
            slots: PlatformId::ALL
                .into_iter()
                .map(|platform| (platform, AdapterSlot::Unimplemented))
                .collect(),
        }
    }

    /// Fill the slot of the adapter's platform, replacing any previous adapter
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) {
        let platform = adapter.platform();
        tracing::debug!(platform = %platform, "Registered platform adapter");
        self.slots.insert(platform, AdapterSlot::Ready(adapter));
    }

    pub fn with_adapter(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Registry with every adapter compiled into this build, configured from `config`
    #[cfg_attr(
        not(any(
            feature = "adapter-youtube",
            feature = "adapter-facebook",
            feature = "adapter-instagram",
            feature = "adapter-twitter",
            feature = "adapter-reddit"
        )),
        allow(unused_variables, unused_mut, unused_imports)
    )]
    pub fn from_config(config: &Config, http: Client) -> Self {
        let mut registry = Self::new();
        use crate::oauth::AdapterSettings;

        #[cfg(feature = "adapter-youtube")]
        registry.register(Arc::new(crate::adapters::YoutubeAdapter::new(
            http.clone(),
            AdapterSettings::from_config(config, PlatformId::Youtube),
        )));
        #[cfg(feature = "adapter-facebook")]
        registry.register(Arc::new(crate::adapters::FacebookAdapter::new(
            http.clone(),
            AdapterSettings::from_config(config, PlatformId::Facebook),
        )));
        #[cfg(feature = "adapter-instagram")]
        registry.register(Arc::new(crate::adapters::InstagramAdapter::new(
            http.clone(),
            AdapterSettings::from_config(config, PlatformId::Instagram),
        )));
        #[cfg(feature = "adapter-twitter")]
        registry.register(Arc::new(crate::adapters::TwitterAdapter::new(
            http.clone(),
            AdapterSettings::from_config(config, PlatformId::Twitter),
        )));
        #[cfg(feature = "adapter-reddit")]
        registry.register(Arc::new(crate::adapters::RedditAdapter::new(
            http.clone(),
            AdapterSettings::from_config(config, PlatformId::Reddit),
        )));

        registry
    }

    /// Resolve a raw selection key by exact match on the platform names
    pub fn resolve(&self, key: &str) -> AdapterLookup {
        match key.parse::<PlatformId>() {
            Ok(platform) => self.lookup(platform),
            Err(_) => AdapterLookup::Unsupported,
        }
    }

    pub fn lookup(&self, platform: PlatformId) -> AdapterLookup {
        match self.slots.get(&platform) {
            Some(AdapterSlot::Ready(adapter)) => AdapterLookup::Ready(adapter.clone()),
            Some(AdapterSlot::Unimplemented) | None => AdapterLookup::Unimplemented(platform),
        }
    }

    /// Adapter for `platform`, or `NotImplemented`
    pub fn adapter(&self, platform: PlatformId) -> Result<Arc<dyn PlatformAdapter>, PlatformError> {
        match self.lookup(platform) {
            AdapterLookup::Ready(adapter) => Ok(adapter),
            _ => Err(PlatformError::NotImplemented(platform)),
        }
    }

    pub fn is_implemented(&self, platform: PlatformId) -> bool {
        matches!(self.slots.get(&platform), Some(AdapterSlot::Ready(_)))
    }

    /// Platforms with a registered adapter, in display order
    pub fn implemented_platforms(&self) -> Vec<PlatformId> {
        PlatformId::ALL
            .into_iter()
            .filter(|p| self.is_implemented(*p))
            .collect()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared HTTP client for all adapters
pub fn http_client() -> Result<Client, PlatformError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(PlatformError::from)
}
