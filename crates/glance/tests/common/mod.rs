#![allow(dead_code)]

use glance::{
    Glance, GlanceConfig, ImageLoader, LayoutConstraint, LoadedImage, LoaderContext,
    LoaderRegistry, ModelLoader, ModelLoaderFactory, PresenterState, ResourceId, Size, Target,
};
use glance_types::{
    ByteSource, Downsampler, LoadJob, LoadReceiver, PresenterHandle, PresenterId, TypeKey,
};
use image::RgbaImage;
use shared::{GlanceError, LoadError, LoadResult};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

pub struct MemorySource(pub String);

impl ByteSource for MemorySource {
    fn describe(&self) -> String {
        self.0.clone()
    }

    fn fetch(self: Box<Self>) -> LoadResult<Vec<u8>> {
        Ok(self.0.into_bytes())
    }
}

/// Path loader that counts how often it is asked for a source.
#[derive(Default)]
pub struct CountingLoader {
    pub streams: AtomicUsize,
}

impl CountingLoader {
    pub fn streams(&self) -> usize {
        self.streams.load(Ordering::SeqCst)
    }
}

impl ModelLoader<PathBuf> for CountingLoader {
    fn stream_source(&self, model: &PathBuf, _: u32, _: u32) -> LoadResult<Box<dyn ByteSource>> {
        self.streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySource(model.display().to_string())))
    }

    fn id(&self, model: &PathBuf) -> String {
        model.display().to_string()
    }
}

/// Hands out one shared `CountingLoader` and counts builds.
#[derive(Default)]
pub struct CountingFactory {
    pub loader: Arc<CountingLoader>,
    pub builds: AtomicUsize,
    pub teardowns: AtomicUsize,
}

impl CountingFactory {
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ModelLoaderFactory<PathBuf> for CountingFactory {
    fn build(
        &self,
        _: &LoaderContext,
        _: &LoaderRegistry,
    ) -> Result<Arc<dyn ModelLoader<PathBuf>>, GlanceError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(self.loader.clone())
    }

    fn loader_type(&self) -> TypeKey {
        TypeKey::of::<CountingLoader>()
    }

    fn teardown(&self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// What the presenter asked the image loader for.
#[derive(Debug, Clone, PartialEq)]
pub struct JobInfo {
    pub source_id: String,
    pub transformation: String,
    pub downsampler: Downsampler,
    pub size: Size,
}

struct PendingJob {
    info: JobInfo,
    cancel: glance_types::CancelFlag,
    sender: Option<oneshot::Sender<LoadResult<LoadedImage>>>,
}

/// Image loader that keeps every job open until the test completes it.
#[derive(Default)]
pub struct ManualImageLoader {
    jobs: RefCell<Vec<PendingJob>>,
}

impl ManualImageLoader {
    pub fn jobs(&self) -> Vec<JobInfo> {
        self.jobs.borrow().iter().map(|job| job.info.clone()).collect()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.borrow().len()
    }

    pub fn is_cancelled(&self, index: usize) -> bool {
        self.jobs.borrow()[index].cancel.is_cancelled()
    }

    /// Deliver a `width`x`height` image for job `index`.
    pub fn complete(&self, index: usize, width: u32, height: u32, from_cache: bool) {
        let mut jobs = self.jobs.borrow_mut();
        let job = &mut jobs[index];
        let image = LoadedImage::new(
            job.info.source_id.clone(),
            RgbaImage::new(width, height),
            from_cache,
        );
        if let Some(sender) = job.sender.take() {
            let _ = sender.send(Ok(image));
        }
    }

    pub fn fail(&self, index: usize, message: &str) {
        let mut jobs = self.jobs.borrow_mut();
        if let Some(sender) = jobs[index].sender.take() {
            let _ = sender.send(Err(LoadError::Unsupported(message.to_string())));
        }
    }
}

impl ImageLoader for ManualImageLoader {
    fn load(&self, job: LoadJob) -> LoadReceiver {
        let (tx, rx) = oneshot::channel();
        self.jobs.borrow_mut().push(PendingJob {
            info: JobInfo {
                source_id: job.source_id.clone(),
                transformation: job.transformation.id().to_string(),
                downsampler: job.downsampler,
                size: job.size,
            },
            cancel: job.cancel.clone(),
            sender: Some(tx),
        });
        rx
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A presenter was bound (`Some`) or detached (`None`).
    Presenter(Option<PresenterId>),
    /// The presenter being detached had already been cleared.
    DetachedCleared(bool),
    Placeholder(Option<ResourceId>),
    Image(String, Size),
    Animation(ResourceId),
}

/// Target that logs every call made on it.
pub struct RecordingTarget {
    presenter: RefCell<Option<Rc<dyn PresenterHandle>>>,
    events: RefCell<Vec<Event>>,
    size: Option<Size>,
    layout: LayoutConstraint,
}

impl RecordingTarget {
    pub fn new(size: Size) -> Self {
        Self::with_layout(Some(size), LayoutConstraint::Fixed)
    }

    pub fn with_layout(size: Option<Size>, layout: LayoutConstraint) -> Self {
        Self {
            presenter: RefCell::new(None),
            events: RefCell::new(Vec::new()),
            size,
            layout,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn take_events(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn presenter_id(&self) -> Option<PresenterId> {
        self.presenter.borrow().as_ref().map(|presenter| presenter.id())
    }

    pub fn state(&self) -> Option<PresenterState> {
        self.presenter.borrow().as_ref().map(|presenter| presenter.state())
    }
}

impl Target for RecordingTarget {
    fn presenter(&self) -> Option<Rc<dyn PresenterHandle>> {
        self.presenter.borrow().clone()
    }

    fn set_presenter(&self, presenter: Option<Rc<dyn PresenterHandle>>) {
        let mut events = self.events.borrow_mut();
        if presenter.is_none() {
            if let Some(previous) = self.presenter.borrow().as_ref() {
                events.push(Event::DetachedCleared(previous.is_cleared()));
            }
        }
        events.push(Event::Presenter(presenter.as_ref().map(|p| p.id())));
        drop(events);
        self.presenter.replace(presenter);
    }

    fn set_placeholder(&self, resource: Option<ResourceId>) {
        self.events.borrow_mut().push(Event::Placeholder(resource));
    }

    fn set_image(&self, image: LoadedImage) {
        self.events
            .borrow_mut()
            .push(Event::Image(image.source_id.clone(), image.size()));
    }

    fn start_animation(&self, animation: ResourceId) {
        self.events.borrow_mut().push(Event::Animation(animation));
    }

    fn size(&self) -> Option<Size> {
        self.size
    }

    fn layout(&self) -> LayoutConstraint {
        self.layout
    }
}

pub struct Harness {
    pub glance: Glance,
    pub factory: Arc<CountingFactory>,
    pub images: Rc<ManualImageLoader>,
}

impl Harness {
    pub fn new() -> Self {
        let registry = Arc::new(LoaderRegistry::default());
        let factory = Arc::new(CountingFactory::default());
        registry.register::<PathBuf>(factory.clone());

        let images = Rc::new(ManualImageLoader::default());
        let glance = Glance::new(
            Arc::new(GlanceConfig::default()),
            registry,
            images.clone(),
        );

        Self {
            glance,
            factory,
            images,
        }
    }
}

/// Let spawned local tasks run.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
