//! Aspect-preserving downscaling for the scale pyramid.

use crate::image::io::{gray_image_from_owned, owned_from_gray_image};
use crate::image::OwnedImage;
use crate::util::{ScreenMatchError, ScreenMatchResult};
use image::imageops::{self, FilterType};

/// Resizes `src` to `width`, deriving the height from the aspect ratio.
///
/// The height is `floor(src_height * width / src_width)`. Resizing to the
/// source width returns a copy without resampling.
pub(crate) fn resize_to_width(src: &OwnedImage, width: usize) -> ScreenMatchResult<OwnedImage> {
    let height = (src.height() as f64 * (width as f64 / src.width() as f64)) as usize;
    if width == 0 || height == 0 {
        return Err(ScreenMatchError::InvalidDimensions { width, height });
    }
    if width == src.width() && height == src.height() {
        return Ok(src.clone());
    }
    let gray = gray_image_from_owned(src)?;
    let resized = imageops::resize(&gray, width as u32, height as u32, FilterType::Triangle);
    owned_from_gray_image(resized)
}
