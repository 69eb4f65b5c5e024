use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, Resizer};
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{LoadError, LoadResult};

/// Pixel dimensions of a target or an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &DynamicImage) -> Self {
        Self::new(image.width(), image.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Largest power of two that keeps the sampled image at least as large as `target`
/// in both dimensions.
pub fn sample_size_at_least(source: Size, target: Size) -> u32 {
    if source.is_empty() || target.is_empty() {
        return 1;
    }
    let factor = (source.width / target.width).min(source.height / target.height);
    highest_power_of_two(factor.max(1))
}

/// Smallest power of two that makes the sampled image fit inside `target`.
pub fn sample_size_at_most(source: Size, target: Size) -> u32 {
    if source.is_empty() || target.is_empty() {
        return 1;
    }
    let factor = source
        .width
        .div_ceil(target.width)
        .max(source.height.div_ceil(target.height))
        .max(1);
    factor.next_power_of_two()
}

fn highest_power_of_two(value: u32) -> u32 {
    1 << (u32::BITS - 1 - value.leading_zeros())
}

/// Scale and offsets for a center crop of `source` into exactly `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropDimensions {
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropDimensions {
    pub fn center_crop(source: Size, target: Size) -> Self {
        let scale = (target.width as f64 / source.width as f64)
            .max(target.height as f64 / source.height as f64);

        let scaled_width = ((source.width as f64 * scale).round() as u32).max(target.width);
        let scaled_height = ((source.height as f64 * scale).round() as u32).max(target.height);

        Self {
            scaled_width,
            scaled_height,
            offset_x: (scaled_width - target.width) / 2,
            offset_y: (scaled_height - target.height) / 2,
            width: target.width,
            height: target.height,
        }
    }
}

/// Largest size with the source aspect ratio that fits inside `target`.
pub fn fit_center_size(source: Size, target: Size) -> Size {
    let scale = (target.width as f64 / source.width as f64)
        .min(target.height as f64 / source.height as f64);

    Size::new(
        ((source.width as f64 * scale).round() as u32).clamp(1, target.width),
        ((source.height as f64 * scale).round() as u32).clamp(1, target.height),
    )
}

pub fn resize_rgba(image: RgbaImage, target: Size) -> LoadResult<RgbaImage> {
    if target.is_empty() {
        return Err(LoadError::Resize(format!("invalid target size {}", target)));
    }

    let (width, height) = image.dimensions();
    if width == target.width && height == target.height {
        return Ok(image);
    }

    let src_image = Image::from_vec_u8(width, height, image.into_raw(), PixelType::U8x4)
        .map_err(|e| LoadError::Resize(e.to_string()))?;

    let mut dst_image = Image::new(target.width, target.height, PixelType::U8x4);

    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, None)
        .map_err(|e| LoadError::Resize(e.to_string()))?;

    RgbaImage::from_raw(target.width, target.height, dst_image.into_vec())
        .ok_or_else(|| LoadError::Resize("resized buffer has the wrong length".into()))
}

/// Scale to cover `target`, then crop the middle.
pub fn center_crop(image: DynamicImage, target: Size) -> LoadResult<DynamicImage> {
    let source = Size::of(&image);
    if source == target || source.is_empty() || target.is_empty() {
        return Ok(image);
    }

    let dims = CropDimensions::center_crop(source, target);
    let scaled = resize_rgba(
        image.into_rgba8(),
        Size::new(dims.scaled_width, dims.scaled_height),
    )?;

    let cropped =
        image::imageops::crop_imm(&scaled, dims.offset_x, dims.offset_y, dims.width, dims.height)
            .to_image();

    Ok(DynamicImage::ImageRgba8(cropped))
}

/// Scale to fit inside `target`, preserving the aspect ratio.
pub fn fit_center(image: DynamicImage, target: Size) -> LoadResult<DynamicImage> {
    let source = Size::of(&image);
    if source == target || source.is_empty() || target.is_empty() {
        return Ok(image);
    }

    let fitted = fit_center_size(source, target);
    Ok(DynamicImage::ImageRgba8(resize_rgba(
        image.into_rgba8(),
        fitted,
    )?))
}

/// Shrink by an integer sample size, as a decoder would when subsampling.
pub fn subsample(image: DynamicImage, sample_size: u32) -> LoadResult<DynamicImage> {
    if sample_size <= 1 {
        return Ok(image);
    }

    let source = Size::of(&image);
    let target = Size::new(
        (source.width / sample_size).max(1),
        (source.height / sample_size).max(1),
    );

    tracing::trace!("Subsampling {} by {} to {}", source, sample_size, target);
    Ok(DynamicImage::ImageRgba8(resize_rgba(
        image.into_rgba8(),
        target,
    )?))
}
