use glance_registry::{LoaderContext, LoaderRegistry, ModelLoaderFactory};
use glance_types::{ByteSource, ModelLoader, TypeKey};
use shared::{GlanceError, LoadError, LoadResult};
use std::path::PathBuf;
use std::sync::Arc;

const FILE_SCHEME: &str = "file://";

/// Loads string models by delegating to the path loader.
///
/// Accepts plain paths and `file://` urls. Any other scheme is rejected.
pub struct StringLoader {
    files: Arc<dyn ModelLoader<PathBuf>>,
}

impl StringLoader {
    pub fn new(files: Arc<dyn ModelLoader<PathBuf>>) -> Self {
        Self { files }
    }
}

fn to_path(model: &str) -> LoadResult<PathBuf> {
    if let Some(path) = model.strip_prefix(FILE_SCHEME) {
        return Ok(PathBuf::from(path));
    }

    match model.split_once("://") {
        Some((scheme, _)) => Err(LoadError::Unsupported(format!(
            "'{}' urls are not loadable from strings: {}",
            scheme, model
        ))),
        None => Ok(PathBuf::from(model)),
    }
}

impl ModelLoader<String> for StringLoader {
    fn stream_source(
        &self,
        model: &String,
        width: u32,
        height: u32,
    ) -> LoadResult<Box<dyn ByteSource>> {
        self.files.stream_source(&to_path(model)?, width, height)
    }

    fn id(&self, model: &String) -> String {
        match to_path(model) {
            Ok(path) => self.files.id(&path),
            Err(_) => model.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringLoaderFactory;

impl ModelLoaderFactory<String> for StringLoaderFactory {
    fn build(
        &self,
        context: &LoaderContext,
        registry: &LoaderRegistry,
    ) -> Result<Arc<dyn ModelLoader<String>>, GlanceError> {
        let files = registry.build_loader::<PathBuf>(context)?;
        Ok(Arc::new(StringLoader::new(files)))
    }

    fn loader_type(&self) -> TypeKey {
        TypeKey::of::<StringLoader>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::{FileLoader, FileLoaderFactory};

    #[test]
    fn test_to_path() {
        assert_eq!(to_path("a/b.png").unwrap(), PathBuf::from("a/b.png"));
        assert_eq!(to_path("file:///tmp/b.png").unwrap(), PathBuf::from("/tmp/b.png"));
        assert!(matches!(
            to_path("https://example.com/a.png"),
            Err(LoadError::Unsupported(_))
        ));
    }

    #[test]
    fn test_ids_match_path_loader() {
        let files = Arc::new(FileLoader::default());
        let loader = StringLoader::new(files.clone());

        let path = PathBuf::from("/nonexistent/a.png");
        assert_eq!(loader.id(&"/nonexistent/a.png".to_string()), files.id(&path));
        assert_eq!(loader.id(&"file:///nonexistent/a.png".to_string()), files.id(&path));
        assert_eq!(
            loader.id(&"ftp://host/a.png".to_string()),
            "ftp://host/a.png"
        );
    }

    #[test]
    fn test_factory_needs_path_loader() {
        let registry = LoaderRegistry::default();
        let context = LoaderContext::default();
        registry.register::<String>(Arc::new(StringLoaderFactory));

        assert!(matches!(
            registry.build_loader::<String>(&context),
            Err(GlanceError::UnregisteredType(_))
        ));

        registry.register::<PathBuf>(Arc::new(FileLoaderFactory));
        assert!(registry.build_loader::<String>(&context).is_ok());
    }
}
