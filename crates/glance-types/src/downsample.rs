use serde::{Deserialize, Serialize};
use shared::Size;
use shared::image::{sample_size_at_least, sample_size_at_most};

/// How much a decoded image may be shrunk relative to the target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Downsampler {
    /// Keep at least the target size in both dimensions.
    #[default]
    AtLeast,
    /// Shrink until the image fits inside the target.
    AtMost,
    /// Decode at full resolution.
    FullSize,
}

impl Downsampler {
    /// Stable identity used in request fingerprints.
    pub fn id(self) -> &'static str {
        match self {
            Downsampler::AtLeast => "AT_LEAST",
            Downsampler::AtMost => "AT_MOST",
            Downsampler::FullSize => "NONE",
        }
    }

    pub fn sample_size(self, source: Size, target: Size) -> u32 {
        match self {
            Downsampler::AtLeast => sample_size_at_least(source, target),
            Downsampler::AtMost => sample_size_at_most(source, target),
            Downsampler::FullSize => 1,
        }
    }
}
