use glance_config::GlanceConfig;
use glance_types::{ImageLoader, LoadJob, LoadReceiver, LoadedImage};
use rayon::{ThreadPool, ThreadPoolBuilder};
use shared::image::subsample;
use shared::{LoadResult, Size};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Decodes on rayon workers and reports back over a oneshot channel.
#[derive(Clone, Default)]
pub struct DecodeLoader {
    pool: Option<Arc<ThreadPool>>,
}

impl DecodeLoader {
    /// Decode on the global rayon pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode on a dedicated pool of `threads` workers, or the global pool for 0.
    pub fn with_threads(threads: usize) -> Self {
        if threads == 0 {
            return Self::new();
        }

        match ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("glance-decode-{}", i))
            .build()
        {
            Ok(pool) => Self {
                pool: Some(Arc::new(pool)),
            },
            Err(err) => {
                warn!("Failed to build decode pool, using the global pool: {}", err);
                Self::new()
            }
        }
    }

    pub fn from_config(config: &GlanceConfig) -> Self {
        Self::with_threads(config.decode_threads)
    }
}

impl ImageLoader for DecodeLoader {
    fn load(&self, job: LoadJob) -> LoadReceiver {
        let (tx, rx) = oneshot::channel();

        let work = move || {
            let result = decode_job(job);
            let _ = tx.send(result);
        };

        match &self.pool {
            Some(pool) => pool.spawn(work),
            None => rayon::spawn(work),
        }

        rx
    }
}

impl std::fmt::Debug for DecodeLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeLoader")
            .field(
                "threads",
                &self.pool.as_ref().map(|pool| pool.current_num_threads()),
            )
            .finish()
    }
}

/// Fetch, decode, downsample and transform one job on the calling thread.
pub fn decode_job(job: LoadJob) -> LoadResult<LoadedImage> {
    let LoadJob {
        source_id,
        source,
        transformation,
        downsampler,
        size,
        cancel,
    } = job;
    let started = Instant::now();

    cancel.check()?;
    let description = source.describe();
    let bytes = source.fetch()?;

    cancel.check()?;
    let decoded = image::load_from_memory(&bytes)?;
    let original = Size::of(&decoded);
    let sampled = subsample(decoded, downsampler.sample_size(original, size))?;

    cancel.check()?;
    let transformed = transformation.transform(sampled, size)?;

    let loaded = LoadedImage::new(source_id, transformed.into_rgba8(), false);
    debug!(
        "Decoded {} ({} -> {}, {}) in {:?}",
        description,
        original,
        loaded.size(),
        transformation.id(),
        started.elapsed()
    );

    Ok(loaded)
}
