use glance_registry::{LoaderRegistry, ModelLoaderFactory};
use glance_types::Model;
use std::fmt;
use std::sync::Arc;

pub const REMOTE_CAPABILITY: &str = "remote url loading";

/// An `http://` or `https://` image url.
///
/// No network stack ships with the library; hosts that have one register a
/// factory through [`install_remote`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteUrl(pub String);

impl RemoteUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Model for RemoteUrl {
    fn is_valid(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Register `factory` for remote urls, or a sentinel that fails every build.
/// Returns whether a real factory was installed.
pub fn install_remote(
    registry: &LoaderRegistry,
    factory: Option<Arc<dyn ModelLoaderFactory<RemoteUrl>>>,
) -> bool {
    registry.register_optional::<RemoteUrl, _>(REMOTE_CAPABILITY, move || factory)
}
