pub mod error;
pub mod image;
pub mod presenter_state;

pub use error::{GlanceError, LoadError, LoadResult};
pub use self::image::Size;
pub use presenter_state::{PresenterEvent, PresenterState};
