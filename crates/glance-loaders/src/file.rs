use glance_config::resolve_against;
use glance_registry::{LoaderContext, LoaderRegistry, ModelLoaderFactory};
use glance_types::{ByteSource, ModelLoader, TypeKey};
use shared::{GlanceError, LoadResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::trace;

/// `path:mtime`, so an edited file gets a new id.
pub fn cache_key(path: &Path) -> String {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let modified_epoch = modified
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    format!("{}:{}", path.display(), modified_epoch)
}

/// Loads images from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    root: Option<PathBuf>,
}

impl FileLoader {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        resolve_against(self.root.as_deref(), path)
    }
}

impl ModelLoader<PathBuf> for FileLoader {
    fn stream_source(
        &self,
        model: &PathBuf,
        _width: u32,
        _height: u32,
    ) -> LoadResult<Box<dyn ByteSource>> {
        Ok(Box::new(FileSource {
            path: self.resolve(model),
        }))
    }

    fn id(&self, model: &PathBuf) -> String {
        cache_key(&self.resolve(model))
    }
}

#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(self: Box<Self>) -> LoadResult<Vec<u8>> {
        trace!("Reading {}", self.path.display());
        Ok(fs::read(&self.path)?)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoaderFactory;

impl ModelLoaderFactory<PathBuf> for FileLoaderFactory {
    fn build(
        &self,
        context: &LoaderContext,
        _registry: &LoaderRegistry,
    ) -> Result<Arc<dyn ModelLoader<PathBuf>>, GlanceError> {
        Ok(Arc::new(FileLoader::new(context.config().root_dir.clone())))
    }

    fn loader_type(&self) -> TypeKey {
        TypeKey::of::<FileLoader>()
    }
}
