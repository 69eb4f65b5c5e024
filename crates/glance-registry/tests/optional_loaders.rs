use glance_registry::{
    FixedLoaderFactory, LoaderContext, LoaderRegistry, ModelLoaderFactory,
    UnavailableLoaderFactory,
};
use glance_types::{ByteSource, ModelLoader, TypeKey};
use shared::{GlanceError, LoadError, LoadResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq)]
struct Url(String);

impl glance_types::Model for Url {}

struct UrlLoader;

impl ModelLoader<Url> for UrlLoader {
    fn stream_source(&self, model: &Url, _: u32, _: u32) -> LoadResult<Box<dyn ByteSource>> {
        Err(LoadError::Unsupported(model.0.clone()))
    }

    fn id(&self, model: &Url) -> String {
        model.0.clone()
    }
}

#[test]
fn test_missing_capability_installs_sentinel() {
    let registry = LoaderRegistry::default();
    let probes = AtomicUsize::new(0);

    let installed = registry.register_optional::<Url, _>("url loading", || {
        probes.fetch_add(1, Ordering::SeqCst);
        None
    });

    assert!(!installed);
    assert_eq!(probes.load(Ordering::SeqCst), 1);
    assert!(registry.contains::<Url>());
    assert_eq!(
        registry.factory::<Url>().map(|factory| factory.loader_type()),
        Some(TypeKey::of::<UnavailableLoaderFactory<Url>>())
    );
    assert!(matches!(
        registry.build_loader::<Url>(&LoaderContext::default()),
        Err(GlanceError::NoLoaderRegistered(_))
    ));
    // Failed builds are not memoised
    assert_eq!(registry.cached_loader_count(), 0);
}

#[test]
fn test_available_capability_installs_factory() {
    let registry = LoaderRegistry::default();

    let installed = registry.register_optional::<Url, _>("url loading", || {
        Some(Arc::new(FixedLoaderFactory::<Url>::new(UrlLoader)) as Arc<dyn ModelLoaderFactory<Url>>)
    });

    assert!(installed);
    let loader = registry
        .build_loader::<Url>(&LoaderContext::default())
        .unwrap();
    assert_eq!(loader.id(&Url("https://a".into())), "https://a");
    assert_eq!(
        registry.factory::<Url>().map(|factory| factory.loader_type()),
        Some(TypeKey::of::<UrlLoader>())
    );
}

#[test]
fn test_registry_is_shareable_across_threads() {
    let registry = Arc::new(LoaderRegistry::default());
    registry.register::<Url>(Arc::new(FixedLoaderFactory::<Url>::new(UrlLoader)));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                registry
                    .build_loader::<Url>(&LoaderContext::default())
                    .is_ok()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
