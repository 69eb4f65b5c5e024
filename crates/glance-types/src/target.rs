use shared::{PresenterState, Size};
use std::any::Any;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::loader::LoadedImage;
use crate::model::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PresenterId(u64);

impl PresenterId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for PresenterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "presenter-{}", self.0)
    }
}

/// Model-independent view of a presenter, as stored by a target.
pub trait PresenterHandle: Any {
    fn id(&self) -> PresenterId;

    fn state(&self) -> PresenterState;

    /// Cancel outstanding work and stop touching the target. Idempotent.
    fn clear(&self);

    fn is_cleared(&self) -> bool {
        self.state().is_cleared()
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// Sizing behaviour of a display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutConstraint {
    /// The surface has (or will have) a size of its own.
    #[default]
    Fixed,
    /// The surface sizes itself after its content, so images must not be downsampled.
    WrapContent,
}

/// A display surface images are presented into.
///
/// Targets own their presenter; presenters only ever hold a target weakly.
/// All methods are called on the presentation thread.
pub trait Target: 'static {
    fn presenter(&self) -> Option<Rc<dyn PresenterHandle>>;

    fn set_presenter(&self, presenter: Option<Rc<dyn PresenterHandle>>);

    /// Show a bundled resource, or nothing.
    fn set_placeholder(&self, resource: Option<ResourceId>);

    fn set_image(&self, image: LoadedImage);

    fn start_animation(&self, animation: ResourceId);

    /// Laid-out size, if known yet.
    fn size(&self) -> Option<Size>;

    fn layout(&self) -> LayoutConstraint {
        LayoutConstraint::Fixed
    }
}
