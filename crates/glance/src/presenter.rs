use glance_types::{
    CancelFlag, ConstantProvider, Downsampler, ImageLoader, LoadJob, LoadedImage, Model,
    ModelLoader, NoTransformation, PresenterHandle, PresenterId, ResourceId, Target,
    TransformationProvider,
};
use shared::{GlanceError, LoadError, LoadResult, PresenterEvent, PresenterState, Size};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tokio::task::{JoinHandle, LocalSet};
use tracing::{debug, trace, warn};

struct InFlight {
    load: u64,
    task: JoinHandle<()>,
    cancel: CancelFlag,
}

impl InFlight {
    fn cancel(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Drives one target: asks the model loader for bytes, hands them to the
/// image loader and shows whatever comes back.
///
/// Lives on the presentation thread. Completions are matched against the
/// current load number so a superseded or cleared load never reaches the
/// target.
pub struct Presenter<M: Model> {
    id: PresenterId,
    this: Weak<Presenter<M>>,
    target: Weak<dyn Target>,
    model_loader: Arc<dyn ModelLoader<M>>,
    image_loader: Rc<dyn ImageLoader>,
    local: Rc<LocalSet>,
    transformation: Rc<dyn TransformationProvider<M>>,
    downsampler: Downsampler,
    placeholder: Option<ResourceId>,
    error: Option<ResourceId>,
    animation: Option<ResourceId>,
    fallback_size: Size,
    state: RefCell<PresenterState>,
    model: RefCell<Option<M>>,
    load_count: Cell<u64>,
    in_flight: RefCell<Option<InFlight>>,
}

impl<M: Model> Presenter<M> {
    /// Completions are awaited on `local`; they only arrive while it is driven.
    pub fn builder(
        target: Weak<dyn Target>,
        model_loader: Arc<dyn ModelLoader<M>>,
        image_loader: Rc<dyn ImageLoader>,
        local: Rc<LocalSet>,
    ) -> PresenterBuilder<M> {
        PresenterBuilder {
            target,
            model_loader,
            image_loader,
            local,
            transformation: Rc::new(ConstantProvider::new(Arc::new(NoTransformation))),
            downsampler: Downsampler::default(),
            placeholder: None,
            error: None,
            animation: None,
            fallback_size: Size::new(1024, 1024),
        }
    }

    pub fn id(&self) -> PresenterId {
        self.id
    }

    pub fn state(&self) -> PresenterState {
        self.state.borrow().clone()
    }

    pub fn is_cleared(&self) -> bool {
        self.state.borrow().is_cleared()
    }

    pub fn model(&self) -> Option<M> {
        self.model.borrow().clone()
    }

    /// Number of loads started so far.
    pub fn load_count(&self) -> u64 {
        self.load_count.get()
    }

    fn transition(&self, event: PresenterEvent) {
        let current = self.state.take();
        *self.state.borrow_mut() = event.apply_to_state(current);
    }

    /// Start loading `model`, replacing whatever load is outstanding.
    ///
    /// Setting the model the presenter is already loading or showing does
    /// nothing.
    pub fn set_model(&self, model: M) -> Result<(), GlanceError> {
        if self.is_cleared() {
            return Err(GlanceError::PresenterCleared);
        }

        if self.model.borrow().as_ref() == Some(&model) && self.state.borrow().is_settled_or_pending()
        {
            trace!("{} already has {:?}", self.id, model);
            return Ok(());
        }

        self.cancel_in_flight();
        let load = self.load_count.get() + 1;
        self.load_count.set(load);
        self.transition(PresenterEvent::ModelSet);
        *self.model.borrow_mut() = Some(model.clone());

        let Some(target) = self.target.upgrade() else {
            debug!("{} lost its target before load {}", self.id, load);
            return Ok(());
        };

        target.set_placeholder(self.placeholder);
        let size = target
            .size()
            .filter(|size| !size.is_empty())
            .unwrap_or(self.fallback_size);

        let source = match self.model_loader.stream_source(&model, size.width, size.height) {
            Ok(source) => source,
            Err(err) => {
                self.fail(target.as_ref(), err);
                return Ok(());
            }
        };

        let cancel = CancelFlag::new();
        let job = LoadJob {
            source_id: self.model_loader.id(&model),
            source,
            transformation: self.transformation.transformation(&model),
            downsampler: self.downsampler,
            size,
            cancel: cancel.clone(),
        };
        debug!("{} starting load {}: {:?}", self.id, load, job);

        let receiver = self.image_loader.load(job);
        let this = self.this.clone();
        let task = self.local.spawn_local(async move {
            let result = receiver
                .await
                .unwrap_or_else(|_| Err(LoadError::Cancelled));

            if let Some(presenter) = this.upgrade() {
                presenter.on_load_complete(load, result);
            }
        });

        *self.in_flight.borrow_mut() = Some(InFlight { load, task, cancel });
        Ok(())
    }

    fn on_load_complete(&self, load: u64, result: LoadResult<LoadedImage>) {
        if self.is_cleared() || load != self.load_count.get() {
            debug!(
                "{} dropping stale completion for load {} (current {}, {})",
                self.id,
                load,
                self.load_count.get(),
                self.state.borrow()
            );
            return;
        }

        {
            let mut in_flight = self.in_flight.borrow_mut();
            if in_flight.as_ref().is_some_and(|flight| flight.load == load) {
                // Finished; dropping the handle detaches it
                in_flight.take();
            }
        }

        let Some(target) = self.target.upgrade() else {
            debug!("{} finished load {} after its target was dropped", self.id, load);
            return;
        };

        match result {
            Ok(image) => {
                let from_cache = image.from_cache;
                debug!(
                    "{} displaying {} ({})",
                    self.id,
                    image.source_id,
                    image.size()
                );
                self.transition(PresenterEvent::LoadComplete);
                target.set_image(image);

                if !from_cache {
                    if let Some(animation) = self.animation {
                        target.start_animation(animation);
                    }
                }
            }
            Err(err) => self.fail(target.as_ref(), err),
        }
    }

    fn fail(&self, target: &dyn Target, err: LoadError) {
        warn!("{} failed to load {:?}: {}", self.id, self.model.borrow(), err);
        self.transition(PresenterEvent::LoadFailed(err.to_string()));

        if let Some(error) = self.error {
            target.set_placeholder(Some(error));
        }
    }

    fn cancel_in_flight(&self) {
        if let Some(in_flight) = self.in_flight.borrow_mut().take() {
            trace!("{} cancelling load {}", self.id, in_flight.load);
            in_flight.cancel();
        }
    }

    /// Cancel outstanding work. The presenter never touches its target again.
    pub fn clear(&self) {
        if self.is_cleared() {
            return;
        }

        self.cancel_in_flight();
        self.transition(PresenterEvent::Clear);
        debug!("{} cleared", self.id);
    }
}

impl<M: Model> PresenterHandle for Presenter<M> {
    fn id(&self) -> PresenterId {
        self.id
    }

    fn state(&self) -> PresenterState {
        Presenter::state(self)
    }

    fn clear(&self) {
        Presenter::clear(self)
    }

    fn is_cleared(&self) -> bool {
        Presenter::is_cleared(self)
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl<M: Model> Drop for Presenter<M> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.get_mut().take() {
            in_flight.cancel();
        }
    }
}

impl<M: Model> fmt::Debug for Presenter<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presenter")
            .field("id", &self.id)
            .field("state", &self.state.borrow())
            .field("model", &self.model.borrow())
            .field("load_count", &self.load_count.get())
            .field("downsampler", &self.downsampler)
            .field("transformation", &self.transformation.id())
            .finish_non_exhaustive()
    }
}

pub struct PresenterBuilder<M: Model> {
    target: Weak<dyn Target>,
    model_loader: Arc<dyn ModelLoader<M>>,
    image_loader: Rc<dyn ImageLoader>,
    local: Rc<LocalSet>,
    transformation: Rc<dyn TransformationProvider<M>>,
    downsampler: Downsampler,
    placeholder: Option<ResourceId>,
    error: Option<ResourceId>,
    animation: Option<ResourceId>,
    fallback_size: Size,
}

impl<M: Model> PresenterBuilder<M> {
    pub fn transformation(mut self, provider: Rc<dyn TransformationProvider<M>>) -> Self {
        self.transformation = provider;
        self
    }

    pub fn downsampler(mut self, downsampler: Downsampler) -> Self {
        self.downsampler = downsampler;
        self
    }

    pub fn placeholder(mut self, placeholder: Option<ResourceId>) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn error(mut self, error: Option<ResourceId>) -> Self {
        self.error = error;
        self
    }

    pub fn animation(mut self, animation: Option<ResourceId>) -> Self {
        self.animation = animation;
        self
    }

    /// Size asked of loaders while the target has none.
    pub fn fallback_size(mut self, size: Size) -> Self {
        self.fallback_size = size;
        self
    }

    pub fn build(self) -> Rc<Presenter<M>> {
        Rc::new_cyclic(|this| Presenter {
            id: PresenterId::next(),
            this: this.clone(),
            target: self.target,
            model_loader: self.model_loader,
            image_loader: self.image_loader,
            local: self.local,
            transformation: self.transformation,
            downsampler: self.downsampler,
            placeholder: self.placeholder,
            error: self.error,
            animation: self.animation,
            fallback_size: self.fallback_size,
            state: RefCell::new(PresenterState::Unbound),
            model: RefCell::new(None),
            load_count: Cell::new(0),
            in_flight: RefCell::new(None),
        })
    }
}
