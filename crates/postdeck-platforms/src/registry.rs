use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, warn};

use postdeck_types::models::Platform;

use crate::error::PlatformError;
use crate::mock::MockProvider;
use crate::provider::PlatformProvider;

/// Central lookup from platform to provider. Built once at startup and
/// shared read-only afterwards.
#[derive(Clone)]
pub struct PlatformRegistry {
    providers: BTreeMap<Platform, Arc<dyn PlatformProvider>>,
    mock_mode: bool,
}

impl PlatformRegistry {
    /// Registry with a provider for every supported platform.
    ///
    /// No real integrations exist yet, so outside mock mode every platform
    /// still falls back to the mock provider.
    pub fn new(mock_mode: bool) -> Self {
        let mut registry = Self::empty(mock_mode);

        if mock_mode {
            info!("Platform registry running in MOCK MODE - using simulated OAuth and publishing");
        } else {
            warn!("Real mode enabled but no providers configured, falling back to mock");
        }

        for platform in Platform::ALL {
            if !registry.providers.contains_key(&platform) {
                registry.register(Arc::new(MockProvider::new(platform)));
            }
        }
        registry
    }

    pub fn empty(mock_mode: bool) -> Self {
        Self {
            providers: BTreeMap::new(),
            mock_mode,
        }
    }

    /// Adds or replaces the provider for its platform.
    pub fn register(&mut self, provider: Arc<dyn PlatformProvider>) {
        self.providers.insert(provider.platform(), provider);
    }

    pub fn get(&self, platform: Platform) -> Result<Arc<dyn PlatformProvider>, PlatformError> {
        self.providers
            .get(&platform)
            .cloned()
            .ok_or_else(|| PlatformError::UnknownPlatform(platform.to_string()))
    }

    /// Lookup by raw name, as it arrives in a URL path.
    pub fn get_by_name(&self, name: &str) -> Result<Arc<dyn PlatformProvider>, PlatformError> {
        let platform: Platform = name
            .parse()
            .map_err(|_| PlatformError::UnknownPlatform(name.to_string()))?;
        self.get(platform)
    }

    pub fn is_mock_mode(&self) -> bool {
        self.mock_mode
    }

    pub fn supported_platforms(&self) -> Vec<Platform> {
        self.providers.keys().copied().collect()
    }
}
