pub mod decode;
pub mod file;
pub mod remote;
pub mod string;

pub use decode::{DecodeLoader, decode_job};
pub use file::{FileLoader, FileLoaderFactory, FileSource, cache_key};
pub use remote::{REMOTE_CAPABILITY, RemoteUrl, install_remote};
pub use string::{StringLoader, StringLoaderFactory};

use glance_registry::{LoaderRegistry, ModelLoaderFactory};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Register the built-in loaders: paths, strings, and remote urls when a
/// remote factory is supplied.
pub fn install_defaults(
    registry: &LoaderRegistry,
    remote: Option<Arc<dyn ModelLoaderFactory<RemoteUrl>>>,
) {
    registry.register::<PathBuf>(Arc::new(FileLoaderFactory));
    registry.register::<String>(Arc::new(StringLoaderFactory));
    let remote_available = install_remote(registry, remote);

    debug!(
        "Installed default loaders (remote urls {})",
        if remote_available { "enabled" } else { "unavailable" }
    );
}
