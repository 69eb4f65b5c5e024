use glance_types::{LayoutConstraint, LoadedImage, PresenterHandle, ResourceId, Target};
use shared::{PresenterState, Size};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::Notify;

const SETTLE_POLL: Duration = Duration::from_millis(50);

/// What a [`SurfaceTarget`] is currently showing.
#[derive(Debug, Clone, Default)]
pub enum Content {
    #[default]
    Empty,
    Placeholder(ResourceId),
    Image(LoadedImage),
}

/// Headless in-memory target. Keeps the last thing it was asked to show.
pub struct SurfaceTarget {
    presenter: RefCell<Option<Rc<dyn PresenterHandle>>>,
    content: RefCell<Content>,
    animations: RefCell<Vec<ResourceId>>,
    size: Cell<Option<Size>>,
    layout: Cell<LayoutConstraint>,
    changed: Notify,
}

impl SurfaceTarget {
    pub fn new(size: Size) -> Self {
        Self::with_layout(Some(size), LayoutConstraint::Fixed)
    }

    /// A surface that sizes itself after its content.
    pub fn wrap_content() -> Self {
        Self::with_layout(None, LayoutConstraint::WrapContent)
    }

    /// A fixed surface that has not been laid out yet.
    pub fn pending() -> Self {
        Self::with_layout(None, LayoutConstraint::Fixed)
    }

    fn with_layout(size: Option<Size>, layout: LayoutConstraint) -> Self {
        Self {
            presenter: RefCell::new(None),
            content: RefCell::new(Content::Empty),
            animations: RefCell::new(Vec::new()),
            size: Cell::new(size),
            layout: Cell::new(layout),
            changed: Notify::new(),
        }
    }

    pub fn resize(&self, size: Size) {
        self.size.set(Some(size));
    }

    pub fn set_layout(&self, layout: LayoutConstraint) {
        self.layout.set(layout);
    }

    pub fn content(&self) -> Content {
        self.content.borrow().clone()
    }

    pub fn image(&self) -> Option<LoadedImage> {
        match &*self.content.borrow() {
            Content::Image(image) => Some(image.clone()),
            _ => None,
        }
    }

    pub fn placeholder(&self) -> Option<ResourceId> {
        match &*self.content.borrow() {
            Content::Placeholder(resource) => Some(*resource),
            _ => None,
        }
    }

    pub fn animations(&self) -> Vec<ResourceId> {
        self.animations.borrow().clone()
    }

    /// State of the bound presenter, if any.
    pub fn presenter_state(&self) -> Option<PresenterState> {
        self.presenter.borrow().as_ref().map(|presenter| presenter.state())
    }

    /// Wait until the surface is next modified.
    pub async fn changed(&self) {
        self.changed.notified().await
    }

    /// Wait until the bound presenter has displayed an image or failed.
    ///
    /// A failure without an error resource leaves the surface untouched, so
    /// the state is also re-checked periodically. Needs a runtime with the
    /// time driver enabled.
    pub async fn settled(&self) -> Option<PresenterState> {
        loop {
            match self.presenter_state() {
                Some(PresenterState::Loading) => {
                    let _ = tokio::time::timeout(SETTLE_POLL, self.changed()).await;
                }
                state => return state,
            }
        }
    }

    fn show(&self, content: Content) {
        *self.content.borrow_mut() = content;
        self.changed.notify_one();
    }
}

impl Target for SurfaceTarget {
    fn presenter(&self) -> Option<Rc<dyn PresenterHandle>> {
        self.presenter.borrow().clone()
    }

    fn set_presenter(&self, presenter: Option<Rc<dyn PresenterHandle>>) {
        self.presenter.replace(presenter);
        self.changed.notify_one();
    }

    fn set_placeholder(&self, resource: Option<ResourceId>) {
        self.show(resource.map_or(Content::Empty, Content::Placeholder));
    }

    fn set_image(&self, image: LoadedImage) {
        self.show(Content::Image(image));
    }

    fn start_animation(&self, animation: ResourceId) {
        self.animations.borrow_mut().push(animation);
        self.changed.notify_one();
    }

    fn size(&self) -> Option<Size> {
        self.size.get()
    }

    fn layout(&self) -> LayoutConstraint {
        self.layout.get()
    }
}

impl fmt::Debug for SurfaceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceTarget")
            .field("content", &self.content.borrow())
            .field("size", &self.size.get())
            .field("layout", &self.layout.get())
            .field("presenter", &self.presenter_state())
            .finish_non_exhaustive()
    }
}
