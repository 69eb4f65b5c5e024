use image::RgbaImage;
use shared::{LoadError, LoadResult, Size};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;

use crate::downsample::Downsampler;
use crate::transform::Transformation;

/// Raw encoded bytes for one model, fetched on a worker thread.
pub trait ByteSource: Send + 'static {
    fn describe(&self) -> String;

    fn fetch(self: Box<Self>) -> LoadResult<Vec<u8>>;
}

/// Resolves models of one type into byte sources.
pub trait ModelLoader<M>: Send + Sync {
    fn stream_source(&self, model: &M, width: u32, height: u32) -> LoadResult<Box<dyn ByteSource>>;

    /// Stable id, unique per distinct underlying resource.
    fn id(&self, model: &M) -> String;
}

/// Cooperative cancellation shared between a presenter and its worker.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn check(&self) -> LoadResult<()> {
        if self.is_cancelled() {
            Err(LoadError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Everything the decode collaborator needs for a single load.
pub struct LoadJob {
    pub source_id: String,
    pub source: Box<dyn ByteSource>,
    pub transformation: Arc<dyn Transformation>,
    pub downsampler: Downsampler,
    pub size: Size,
    pub cancel: CancelFlag,
}

impl Debug for LoadJob {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadJob")
            .field("source_id", &self.source_id)
            .field("source", &self.source.describe())
            .field("transformation", &self.transformation.id())
            .field("downsampler", &self.downsampler)
            .field("size", &self.size)
            .finish()
    }
}

#[derive(Clone)]
pub struct LoadedImage {
    pub pixels: Arc<RgbaImage>,
    pub width: u32,
    pub height: u32,
    pub source_id: String,
    pub from_cache: bool,
}

impl LoadedImage {
    pub fn new(source_id: String, pixels: RgbaImage, from_cache: bool) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            pixels: Arc::new(pixels),
            width,
            height,
            source_id,
            from_cache,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Debug for LoadedImage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("source_id", &self.source_id)
            .field("from_cache", &self.from_cache)
            .finish_non_exhaustive()
    }
}

pub type LoadReceiver = oneshot::Receiver<LoadResult<LoadedImage>>;

/// The decode collaborator: turns a job into a decoded, transformed image.
///
/// Implementations run the work off the presentation thread and report
/// through the returned channel. Once `job.cancel` is raised they should stop
/// early; a dropped receiver means nobody is listening any more.
pub trait ImageLoader {
    fn load(&self, job: LoadJob) -> LoadReceiver;
}
