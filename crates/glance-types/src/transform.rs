use image::DynamicImage;
use shared::image::{center_crop, fit_center};
use shared::{LoadResult, Size};
use std::fmt;
use std::sync::Arc;

/// A transformation applied to a decoded image before it is displayed.
///
/// Two transformations reporting the same `id` are interchangeable; the id is
/// part of the request fingerprint.
pub trait Transformation: Send + Sync {
    fn id(&self) -> &str;

    fn transform(&self, image: DynamicImage, size: Size) -> LoadResult<DynamicImage>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransformation;

impl Transformation for NoTransformation {
    fn id(&self) -> &str {
        "NONE"
    }

    fn transform(&self, image: DynamicImage, _size: Size) -> LoadResult<DynamicImage> {
        Ok(image)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CenterCrop;

impl Transformation for CenterCrop {
    fn id(&self) -> &str {
        "CENTER_CROP"
    }

    fn transform(&self, image: DynamicImage, size: Size) -> LoadResult<DynamicImage> {
        center_crop(image, size)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FitCenter;

impl Transformation for FitCenter {
    fn id(&self) -> &str {
        "FIT_CENTER"
    }

    fn transform(&self, image: DynamicImage, size: Size) -> LoadResult<DynamicImage> {
        fit_center(image, size)
    }
}

/// A transformation built from a closure and an explicit identity.
pub struct FnTransformation<F> {
    id: String,
    f: F,
}

impl<F> FnTransformation<F>
where
    F: Fn(DynamicImage, Size) -> LoadResult<DynamicImage> + Send + Sync,
{
    pub fn new(id: impl Into<String>, f: F) -> Self {
        Self { id: id.into(), f }
    }
}

impl<F> Transformation for FnTransformation<F>
where
    F: Fn(DynamicImage, Size) -> LoadResult<DynamicImage> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn transform(&self, image: DynamicImage, size: Size) -> LoadResult<DynamicImage> {
        (self.f)(image, size)
    }
}

impl<F> fmt::Debug for FnTransformation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransformation")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Chooses a transformation per model.
///
/// Providers must report a stable `id`: it stands in for every transformation
/// the provider may return when requests are compared.
pub trait TransformationProvider<M>: 'static {
    fn id(&self) -> &str;

    fn transformation(&self, model: &M) -> Arc<dyn Transformation>;
}

/// Always yields the same transformation.
#[derive(Clone)]
pub struct ConstantProvider {
    transformation: Arc<dyn Transformation>,
}

impl ConstantProvider {
    pub fn new(transformation: Arc<dyn Transformation>) -> Self {
        Self { transformation }
    }
}

impl<M> TransformationProvider<M> for ConstantProvider {
    fn id(&self) -> &str {
        self.transformation.id()
    }

    fn transformation(&self, _model: &M) -> Arc<dyn Transformation> {
        self.transformation.clone()
    }
}

impl fmt::Debug for ConstantProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConstantProvider")
            .field(&self.transformation.id())
            .finish()
    }
}

/// A provider built from a closure and an explicit identity.
pub struct FnProvider<F> {
    id: String,
    f: F,
}

impl<F> FnProvider<F> {
    pub fn new(id: impl Into<String>, f: F) -> Self {
        Self { id: id.into(), f }
    }
}

impl<M, F> TransformationProvider<M> for FnProvider<F>
where
    F: Fn(&M) -> Arc<dyn Transformation> + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn transformation(&self, model: &M) -> Arc<dyn Transformation> {
        (self.f)(model)
    }
}
