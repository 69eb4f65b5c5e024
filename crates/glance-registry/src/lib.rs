pub mod factory;
pub mod registry;

pub use factory::{FixedLoaderFactory, LoaderContext, ModelLoaderFactory, UnavailableLoaderFactory};
pub use registry::LoaderRegistry;
