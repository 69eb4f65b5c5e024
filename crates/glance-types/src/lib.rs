pub mod downsample;
pub mod loader;
pub mod model;
pub mod target;
pub mod transform;

pub use downsample::Downsampler;
pub use loader::{ByteSource, CancelFlag, ImageLoader, LoadJob, LoadReceiver, LoadedImage, ModelLoader};
pub use model::{Model, ResourceId, TypeKey};
pub use target::{LayoutConstraint, PresenterHandle, PresenterId, Target};
pub use transform::{
    CenterCrop, ConstantProvider, FitCenter, FnProvider, FnTransformation, NoTransformation,
    Transformation, TransformationProvider,
};
