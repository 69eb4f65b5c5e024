use glance_types::{Model, ModelLoader, TypeKey};
use lru::LruCache;
use shared::GlanceError;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, trace};

use crate::factory::{LoaderContext, ModelLoaderFactory, UnavailableLoaderFactory};

trait ErasedFactory: Send + Sync {
    fn teardown(&self);
    fn loader_type(&self) -> TypeKey;
    fn as_any(&self) -> &dyn Any;
}

struct Slot<M: 'static>(Arc<dyn ModelLoaderFactory<M>>);

impl<M: 'static> ErasedFactory for Slot<M> {
    fn teardown(&self) {
        self.0.teardown();
    }

    fn loader_type(&self) -> TypeKey {
        self.0.loader_type()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct Registration {
    model: TypeKey,
    slot: Box<dyn ErasedFactory>,
}

struct CachedLoader {
    generation: u64,
    loader: Box<dyn Any + Send + Sync>,
}

/// Maps model types to the factories that build their loaders.
///
/// Safe to share between threads. Built loaders are memoised per model type.
/// Any change to the registered factories drops every memoised loader, since
/// a loader may hold delegates built from other types' factories.
pub struct LoaderRegistry {
    factories: RwLock<HashMap<TypeId, Registration>>,
    loaders: Mutex<LruCache<TypeId, CachedLoader>>,
    generation: AtomicU64,
}

impl LoaderRegistry {
    pub fn new(loader_cache_capacity: usize) -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            loaders: Mutex::new(LruCache::new(
                NonZeroUsize::new(loader_cache_capacity.max(1)).unwrap_or(NonZeroUsize::MIN),
            )),
            generation: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeId, Registration>> {
        self.factories.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeId, Registration>> {
        self.factories.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install `factory` for `M`, returning the factory it displaced.
    ///
    /// The displaced factory is torn down before this returns.
    pub fn register<M: Model>(
        &self,
        factory: Arc<dyn ModelLoaderFactory<M>>,
    ) -> Option<Arc<dyn ModelLoaderFactory<M>>> {
        let model = TypeKey::of::<M>();
        let registration = Registration {
            model,
            slot: Box::new(Slot(factory)),
        };

        let displaced = self.write().insert(model.id(), registration);
        self.invalidate_loaders();

        let displaced = displaced?;
        info!(
            "Replaced loader factory for {} (was {})",
            model,
            displaced.slot.loader_type()
        );
        displaced.slot.teardown();

        displaced
            .slot
            .as_any()
            .downcast_ref::<Slot<M>>()
            .map(|slot| slot.0.clone())
    }

    /// Register the factory produced by `probe`, or a sentinel whose loaders
    /// always fail if the capability is absent. Returns whether the real
    /// factory was installed.
    pub fn register_optional<M, P>(&self, capability: &'static str, probe: P) -> bool
    where
        M: Model,
        P: FnOnce() -> Option<Arc<dyn ModelLoaderFactory<M>>>,
    {
        match probe() {
            Some(factory) => {
                self.register::<M>(factory);
                true
            }
            None => {
                debug!(
                    "{} not available, missing loader for {}",
                    capability,
                    type_name::<M>()
                );
                self.register::<M>(Arc::new(UnavailableLoaderFactory::<M>::new(capability)));
                false
            }
        }
    }

    /// Remove and tear down the factory for `M`.
    pub fn unregister<M: Model>(&self) -> bool {
        let removed = self.write().remove(&TypeId::of::<M>());
        self.invalidate_loaders();

        match removed {
            Some(registration) => {
                registration.slot.teardown();
                true
            }
            None => false,
        }
    }

    pub fn factory<M: Model>(&self) -> Option<Arc<dyn ModelLoaderFactory<M>>> {
        let factories = self.read();
        let registration = factories.get(&TypeId::of::<M>())?;
        let slot = registration.slot.as_any().downcast_ref::<Slot<M>>()?;
        Some(slot.0.clone())
    }

    fn is_registered<M: Model>(&self, factory: &Arc<dyn ModelLoaderFactory<M>>) -> bool {
        self.factory::<M>()
            .is_some_and(|current| std::ptr::addr_eq(Arc::as_ptr(&current), Arc::as_ptr(factory)))
    }

    pub fn contains<M: Model>(&self) -> bool {
        self.read().contains_key(&TypeId::of::<M>())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Build (or reuse) the loader for `M` from its registered factory.
    pub fn build_loader<M: Model>(
        &self,
        context: &LoaderContext,
    ) -> Result<Arc<dyn ModelLoader<M>>, GlanceError> {
        let factory = self
            .factory::<M>()
            .ok_or(GlanceError::UnregisteredType(type_name::<M>()))?;
        self.build_loader_from(&factory, context)
    }

    /// Build a loader with `factory`. The memoised loader is shared only while
    /// `factory` is still the one registered for `M`.
    pub fn build_loader_from<M: Model>(
        &self,
        factory: &Arc<dyn ModelLoaderFactory<M>>,
        context: &LoaderContext,
    ) -> Result<Arc<dyn ModelLoader<M>>, GlanceError> {
        // Read before the registration check so a concurrent change marks the result stale
        let generation = self.generation.load(Ordering::Acquire);

        if !self.is_registered(factory) {
            trace!("Building unregistered factory for {}", type_name::<M>());
            return factory.build(context, self);
        }

        if let Some(loader) = self.cached_loader::<M>(generation) {
            return Ok(loader);
        }

        // Factories may build their delegates through this registry, so no lock is held here
        let loader = factory.build(context, self)?;

        if let Ok(mut cache) = self.loaders.lock() {
            if generation == self.generation.load(Ordering::Acquire) {
                cache.put(
                    TypeId::of::<M>(),
                    CachedLoader {
                        generation,
                        loader: Box::new(loader.clone()),
                    },
                );
            }
        }

        Ok(loader)
    }

    fn cached_loader<M: Model>(&self, generation: u64) -> Option<Arc<dyn ModelLoader<M>>> {
        let mut cache = self.loaders.lock().ok()?;
        let cached = cache.get(&TypeId::of::<M>())?;
        if cached.generation != generation {
            return None;
        }
        cached
            .loader
            .downcast_ref::<Arc<dyn ModelLoader<M>>>()
            .cloned()
    }

    fn invalidate_loaders(&self) {
        let mut cache = self.loaders.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        cache.clear();
    }

    pub fn cached_loader_count(&self) -> usize {
        self.loaders.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new(16)
    }
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factories = self.read();
        let mut models: Vec<&'static str> = factories.values().map(|r| r.model.name()).collect();
        models.sort_unstable();
        f.debug_struct("LoaderRegistry")
            .field("models", &models)
            .finish_non_exhaustive()
    }
}
