pub mod fingerprint;
pub mod logging;
pub mod presenter;
pub mod request;
pub mod surface;
pub mod tracker;

pub use fingerprint::Fingerprint;
pub use presenter::{Presenter, PresenterBuilder};
pub use request::{ModelRequest, Request, TransformMode};
pub use surface::{Content, SurfaceTarget};
pub use tracker::{AttachOutcome, TargetTracker};

pub use glance_config::GlanceConfig;
pub use glance_loaders::{DecodeLoader, RemoteUrl};
pub use glance_registry::{FixedLoaderFactory, LoaderContext, LoaderRegistry, ModelLoaderFactory};
pub use glance_types::{
    Downsampler, ImageLoader, LayoutConstraint, LoadedImage, Model, ModelLoader, ResourceId,
    Target, Transformation, TransformationProvider,
};
pub use shared::{GlanceError, LoadError, PresenterState, Size};

use once_cell::sync::Lazy;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;
use tokio::task::LocalSet;
use tracing::debug;

static CONFIG: Lazy<Arc<GlanceConfig>> = Lazy::new(|| Arc::new(glance_config::load()));

static REGISTRY: Lazy<Arc<LoaderRegistry>> = Lazy::new(|| {
    let registry = LoaderRegistry::new(CONFIG.loader_cache_capacity);
    glance_loaders::install_defaults(&registry, None);
    Arc::new(registry)
});

thread_local! {
    static CURRENT: Glance = Glance::new(
        CONFIG.clone(),
        REGISTRY.clone(),
        Rc::new(DecodeLoader::from_config(&CONFIG)),
    );
}

/// Process-wide configuration, read from the user config file on first use.
pub fn global_config() -> &'static Arc<GlanceConfig> {
    &CONFIG
}

/// Process-wide loader registry with the default loaders installed.
pub fn global_registry() -> &'static Arc<LoaderRegistry> {
    &REGISTRY
}

struct Inner {
    config: Arc<GlanceConfig>,
    registry: Arc<LoaderRegistry>,
    context: LoaderContext,
    image_loader: Rc<dyn ImageLoader>,
    tracker: TargetTracker,
    local: Rc<LocalSet>,
}

/// Entry point for loading images into targets.
///
/// Cheap to clone. Bound to the presentation thread; use [`Glance::current`]
/// for the shared instance of the calling thread. Load completions are
/// delivered while the presentation thread drives [`Glance::run_until`];
/// until then they queue up.
#[derive(Clone)]
pub struct Glance {
    inner: Rc<Inner>,
}

impl Glance {
    pub fn new(
        config: Arc<GlanceConfig>,
        registry: Arc<LoaderRegistry>,
        image_loader: Rc<dyn ImageLoader>,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                context: LoaderContext::new(config.clone()),
                config,
                registry,
                image_loader,
                tracker: TargetTracker::new(),
                local: Rc::new(LocalSet::new()),
            }),
        }
    }

    /// A standalone instance with its own registry and the default loaders.
    pub fn with_config(config: GlanceConfig) -> Self {
        let registry = LoaderRegistry::new(config.loader_cache_capacity);
        glance_loaders::install_defaults(&registry, None);
        let image_loader = Rc::new(DecodeLoader::from_config(&config));
        Self::new(Arc::new(config), Arc::new(registry), image_loader)
    }

    /// The calling thread's instance, sharing the global registry.
    pub fn current() -> Self {
        CURRENT.with(Clone::clone)
    }

    pub fn config(&self) -> &GlanceConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Arc<LoaderRegistry> {
        &self.inner.registry
    }

    pub fn loader_context(&self) -> &LoaderContext {
        &self.inner.context
    }

    pub fn image_loader(&self) -> Rc<dyn ImageLoader> {
        self.inner.image_loader.clone()
    }

    pub fn tracker(&self) -> &TargetTracker {
        &self.inner.tracker
    }

    pub(crate) fn local(&self) -> Rc<LocalSet> {
        self.inner.local.clone()
    }

    /// Run `future` on the presentation thread, delivering load completions
    /// to presenters while it runs.
    pub async fn run_until<F: Future>(&self, future: F) -> F::Output {
        self.inner.local.run_until(future).await
    }

    /// Install `factory` for `M`. A displaced factory is torn down first.
    pub fn register<M: Model>(&self, factory: Arc<dyn ModelLoaderFactory<M>>) {
        self.inner.registry.register::<M>(factory);
    }

    pub fn build_model_loader<M: Model>(&self) -> Result<Arc<dyn ModelLoader<M>>, GlanceError> {
        self.inner.registry.build_loader::<M>(&self.inner.context)
    }

    /// Start a request for `model` with the factory registered for its type.
    pub fn load<M: Model>(&self, model: M) -> Result<Request<M>, GlanceError> {
        Request::new(self.clone(), model, |glance| glance.registry().factory::<M>())
    }

    /// Load with `factory` instead of the registered one.
    pub fn using<M: Model>(&self, factory: Arc<dyn ModelLoaderFactory<M>>) -> ModelRequest<M> {
        ModelRequest::new(self.clone(), factory)
    }

    /// Load with an already built loader.
    pub fn using_loader<M, L>(&self, loader: L) -> ModelRequest<M>
    where
        M: Model,
        L: ModelLoader<M> + 'static,
    {
        self.using::<M>(Arc::new(FixedLoaderFactory::<M>::new(loader)))
    }

    /// Clear and detach whatever is loading into `target`. Returns whether an
    /// active load was cancelled.
    pub fn cancel<T: Target>(&self, target: &Rc<T>) -> bool {
        let target: Rc<dyn Target> = target.clone();
        let cancelled = self.inner.tracker.cancel(&target);
        debug!("Cancel requested (active: {})", cancelled);
        cancelled
    }
}

impl fmt::Debug for Glance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Glance")
            .field("registry", &self.inner.registry)
            .field("tracker", &self.inner.tracker)
            .finish_non_exhaustive()
    }
}
