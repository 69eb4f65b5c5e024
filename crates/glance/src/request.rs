use glance_registry::ModelLoaderFactory;
use glance_types::{
    CenterCrop, ConstantProvider, Downsampler, FitCenter, LayoutConstraint, Model,
    NoTransformation, ResourceId, Target, Transformation, TransformationProvider, TypeKey,
};
use shared::GlanceError;
use std::any::type_name;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::Glance;
use crate::fingerprint::Fingerprint;
use crate::presenter::Presenter;
use crate::tracker::AttachOutcome;

/// How a loaded image is fitted to its target. The last one set wins.
pub enum TransformMode<M> {
    /// Downsample close to the target size, no transformation.
    Approximate,
    CenterCrop,
    FitCenter,
    /// Full resolution, no transformation.
    AsIs,
    Custom(Arc<dyn Transformation>),
    Provider(Rc<dyn TransformationProvider<M>>),
}

impl<M: Model> TransformMode<M> {
    pub fn provider(&self) -> Rc<dyn TransformationProvider<M>> {
        let transformation: Arc<dyn Transformation> = match self {
            TransformMode::Approximate | TransformMode::AsIs => Arc::new(NoTransformation),
            TransformMode::CenterCrop => Arc::new(CenterCrop),
            TransformMode::FitCenter => Arc::new(FitCenter),
            TransformMode::Custom(transformation) => transformation.clone(),
            TransformMode::Provider(provider) => return provider.clone(),
        };
        Rc::new(ConstantProvider::new(transformation))
    }

    pub fn downsampler(&self) -> Downsampler {
        match self {
            TransformMode::AsIs => Downsampler::FullSize,
            _ => Downsampler::AtLeast,
        }
    }
}

impl<M> Default for TransformMode<M> {
    fn default() -> Self {
        TransformMode::Approximate
    }
}

impl<M: 'static> fmt::Debug for TransformMode<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformMode::Approximate => f.write_str("Approximate"),
            TransformMode::CenterCrop => f.write_str("CenterCrop"),
            TransformMode::FitCenter => f.write_str("FitCenter"),
            TransformMode::AsIs => f.write_str("AsIs"),
            TransformMode::Custom(transformation) => {
                f.debug_tuple("Custom").field(&transformation.id()).finish()
            }
            TransformMode::Provider(provider) => {
                f.debug_tuple("Provider").field(&provider.id()).finish()
            }
        }
    }
}

/// Loads with an explicitly chosen factory instead of the registered one.
pub struct ModelRequest<M: Model> {
    glance: Glance,
    factory: Arc<dyn ModelLoaderFactory<M>>,
}

impl<M: Model> ModelRequest<M> {
    pub(crate) fn new(glance: Glance, factory: Arc<dyn ModelLoaderFactory<M>>) -> Self {
        Self { glance, factory }
    }

    pub fn load(&self, model: M) -> Result<Request<M>, GlanceError> {
        Request::new(self.glance.clone(), model, |_| Some(self.factory.clone()))
    }
}

/// Options for loading one model into one target.
///
/// Consumed by [`Request::into`].
pub struct Request<M: Model> {
    glance: Glance,
    model: M,
    factory: Arc<dyn ModelLoaderFactory<M>>,
    transform: TransformMode<M>,
    downsample: Option<Downsampler>,
    animation: Option<ResourceId>,
    placeholder: Option<ResourceId>,
    error: Option<ResourceId>,
}

impl<M: Model> Request<M> {
    /// Validates `model` before resolving its factory, so an invalid model is
    /// reported even when no factory exists for its type.
    pub(crate) fn new<F>(glance: Glance, model: M, factory: F) -> Result<Self, GlanceError>
    where
        F: FnOnce(&Glance) -> Option<Arc<dyn ModelLoaderFactory<M>>>,
    {
        if !model.is_valid() {
            return Err(GlanceError::InvalidModel(type_name::<M>()));
        }
        let factory = factory(&glance).ok_or(GlanceError::NoFactory(type_name::<M>()))?;

        Ok(Self {
            glance,
            model,
            factory,
            transform: TransformMode::default(),
            downsample: None,
            animation: None,
            placeholder: None,
            error: None,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn center_crop(mut self) -> Self {
        self.transform = TransformMode::CenterCrop;
        self
    }

    pub fn fit_center(mut self) -> Self {
        self.transform = TransformMode::FitCenter;
        self
    }

    pub fn approximate(mut self) -> Self {
        self.transform = TransformMode::Approximate;
        self
    }

    pub fn as_is(mut self) -> Self {
        self.transform = TransformMode::AsIs;
        self
    }

    pub fn transform(mut self, transformation: Arc<dyn Transformation>) -> Self {
        self.transform = TransformMode::Custom(transformation);
        self
    }

    /// Choose the transformation per model. The provider's `id` stands in for
    /// the transformation when requests are compared.
    pub fn transform_with(mut self, provider: Rc<dyn TransformationProvider<M>>) -> Self {
        self.transform = TransformMode::Provider(provider);
        self
    }

    /// Override the downsampler implied by the transform mode.
    pub fn downsample(mut self, downsampler: Downsampler) -> Self {
        self.downsample = Some(downsampler);
        self
    }

    pub fn animate(mut self, animation: ResourceId) -> Self {
        self.animation = Some(animation);
        self
    }

    pub fn placeholder(mut self, placeholder: ResourceId) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn error(mut self, error: ResourceId) -> Self {
        self.error = Some(error);
        self
    }

    fn effective_downsampler(&self, layout: LayoutConstraint) -> Downsampler {
        match layout {
            LayoutConstraint::WrapContent => Downsampler::FullSize,
            LayoutConstraint::Fixed => self
                .downsample
                .unwrap_or_else(|| self.transform.downsampler()),
        }
    }

    /// The fingerprint this request would be tracked with on `target`.
    pub fn fingerprint(&self, target: &dyn Target) -> Fingerprint {
        Fingerprint::new(
            TypeKey::of::<M>(),
            self.factory.loader_type(),
            self.effective_downsampler(target.layout()),
            self.transform.provider().id(),
            self.animation,
            self.placeholder,
            self.error,
        )
    }

    /// Start loading into `target`, reusing its presenter when the previous
    /// request on it was equivalent.
    ///
    /// Must run on the presentation thread. The load completes while the
    /// thread drives [`Glance::run_until`].
    pub fn into<T: Target>(self, target: &Rc<T>) -> Result<AttachOutcome, GlanceError> {
        let target: Rc<dyn Target> = target.clone();
        self.into_dyn(&target)
    }

    pub fn into_dyn(self, target: &Rc<dyn Target>) -> Result<AttachOutcome, GlanceError> {
        let downsampler = self.effective_downsampler(target.layout());
        let provider = self.transform.provider();
        let fingerprint = self.fingerprint(target.as_ref());

        let Request {
            glance,
            model,
            factory,
            animation,
            placeholder,
            error,
            ..
        } = self;

        glance.tracker().attach(
            target,
            fingerprint,
            |target| {
                // The factory the fingerprint was taken from, even if the registry moved on
                let model_loader = glance
                    .registry()
                    .build_loader_from(&factory, glance.loader_context())?;

                Ok(Presenter::builder(
                    target,
                    model_loader,
                    glance.image_loader(),
                    glance.local(),
                )
                .transformation(provider)
                .downsampler(downsampler)
                .placeholder(placeholder)
                .error(error)
                .animation(animation)
                .fallback_size(glance.config().fallback_size)
                .build())
            },
            model,
        )
    }
}

impl<M: Model> fmt::Debug for Request<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("model", &self.model)
            .field("loader", &self.factory.loader_type())
            .field("transform", &self.transform)
            .field("downsample", &self.downsample)
            .field("animation", &self.animation)
            .field("placeholder", &self.placeholder)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
