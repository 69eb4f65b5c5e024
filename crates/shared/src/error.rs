use thiserror::Error;

/// Errors surfaced synchronously to whoever builds or finalizes a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlanceError {
    #[error("Model can't be empty or invalid ({0})")]
    InvalidModel(&'static str),

    #[error("No ModelLoaderFactory registered for {0}")]
    NoFactory(&'static str),

    #[error("No factory registered for model type {0}")]
    UnregisteredType(&'static str),

    #[error("No loader available for {0}")]
    NoLoaderRegistered(&'static str),

    #[error("Presenter has been cleared")]
    PresenterCleared,
}

/// Failures produced by loaders and the decode collaborator. These never reach
/// the caller of `into`; they move a presenter into its failed state.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to resize image: {0}")]
    Resize(String),

    #[error("Unsupported source: {0}")]
    Unsupported(String),

    #[error("Load cancelled")]
    Cancelled,
}

pub type LoadResult<T> = Result<T, LoadError>;
