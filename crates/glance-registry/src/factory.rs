use glance_config::GlanceConfig;
use glance_types::{ModelLoader, TypeKey};
use shared::GlanceError;
use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::registry::LoaderRegistry;

/// Environment handed to factories when they build a loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderContext {
    config: Arc<GlanceConfig>,
}

impl LoaderContext {
    pub fn new(config: Arc<GlanceConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GlanceConfig {
        &self.config
    }
}

/// Builds model loaders for one model type.
pub trait ModelLoaderFactory<M>: Send + Sync {
    fn build(
        &self,
        context: &LoaderContext,
        registry: &LoaderRegistry,
    ) -> Result<Arc<dyn ModelLoader<M>>, GlanceError>;

    /// Runtime type of the loaders this factory builds.
    fn loader_type(&self) -> TypeKey;

    /// Release whatever the factory holds. Called once when it is displaced.
    fn teardown(&self) {}
}

/// Wraps an already-built loader.
pub struct FixedLoaderFactory<M> {
    loader: Arc<dyn ModelLoader<M>>,
    loader_type: TypeKey,
}

impl<M> FixedLoaderFactory<M> {
    pub fn new<L>(loader: L) -> Self
    where
        L: ModelLoader<M> + 'static,
    {
        Self::from_arc(Arc::new(loader))
    }

    pub fn from_arc<L>(loader: Arc<L>) -> Self
    where
        L: ModelLoader<M> + 'static,
    {
        Self {
            loader,
            loader_type: TypeKey::of::<L>(),
        }
    }
}

impl<M> ModelLoaderFactory<M> for FixedLoaderFactory<M> {
    fn build(
        &self,
        _context: &LoaderContext,
        _registry: &LoaderRegistry,
    ) -> Result<Arc<dyn ModelLoader<M>>, GlanceError> {
        Ok(self.loader.clone())
    }

    fn loader_type(&self) -> TypeKey {
        self.loader_type
    }
}

/// Stands in for a loader whose capability is missing at runtime.
pub struct UnavailableLoaderFactory<M> {
    capability: &'static str,
    _model: PhantomData<fn() -> M>,
}

impl<M> UnavailableLoaderFactory<M> {
    pub fn new(capability: &'static str) -> Self {
        Self {
            capability,
            _model: PhantomData,
        }
    }
}

impl<M: 'static> ModelLoaderFactory<M> for UnavailableLoaderFactory<M> {
    fn build(
        &self,
        _context: &LoaderContext,
        _registry: &LoaderRegistry,
    ) -> Result<Arc<dyn ModelLoader<M>>, GlanceError> {
        debug!(
            "Capability '{}' missing, no loader for {}",
            self.capability,
            type_name::<M>()
        );
        Err(GlanceError::NoLoaderRegistered(type_name::<M>()))
    }

    fn loader_type(&self) -> TypeKey {
        TypeKey::of::<Self>()
    }
}

impl<M> fmt::Debug for UnavailableLoaderFactory<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnavailableLoaderFactory")
            .field("capability", &self.capability)
            .field("model", &type_name::<M>())
            .finish()
    }
}
