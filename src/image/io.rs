//! Conversions between the `image` crate and [`OwnedImage`].

use crate::image::OwnedImage;
use crate::util::{ScreenMatchError, ScreenMatchResult};
use image::{DynamicImage, GrayImage};
use std::path::Path;

/// Creates an owned image from a grayscale image buffer.
pub fn owned_from_gray_image(img: GrayImage) -> ScreenMatchResult<OwnedImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    OwnedImage::new(img.into_raw(), width, height)
}

/// Converts any decoded image to luma and takes ownership of the buffer.
pub fn owned_from_dynamic_image(img: &DynamicImage) -> ScreenMatchResult<OwnedImage> {
    owned_from_gray_image(img.to_luma8())
}

/// Converts an owned grayscale image back into an `image` buffer.
pub fn gray_image_from_owned(img: &OwnedImage) -> ScreenMatchResult<GrayImage> {
    GrayImage::from_raw(img.width() as u32, img.height() as u32, img.data().to_vec()).ok_or(
        ScreenMatchError::BufferTooSmall {
            needed: img.width() * img.height(),
            got: img.data().len(),
        },
    )
}

/// Loads an image from disk and converts it to grayscale.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> ScreenMatchResult<OwnedImage> {
    let img = image::open(path)?;
    owned_from_dynamic_image(&img)
}

/// Decodes an encoded screenshot (PNG, JPEG) held in memory.
pub fn decode_screen(bytes: &[u8]) -> ScreenMatchResult<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::{decode_screen, gray_image_from_owned, owned_from_dynamic_image};
    use crate::image::OwnedImage;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    #[test]
    fn dynamic_rgb_converts_to_luma() {
        let mut rgb = RgbImage::new(2, 1);
        rgb.put_pixel(0, 0, Rgb([255, 255, 255]));
        rgb.put_pixel(1, 0, Rgb([0, 0, 0]));
        let owned = owned_from_dynamic_image(&DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!((owned.width(), owned.height()), (2, 1));
        assert_eq!(owned.data(), &[255, 0]);
    }

    #[test]
    fn decode_screen_reads_png_bytes() {
        let owned = OwnedImage::new(vec![10, 20, 30, 40, 50, 60], 3, 2).unwrap();
        let gray = gray_image_from_owned(&owned).unwrap();
        let mut bytes = Vec::new();
        gray.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let decoded = decode_screen(&bytes).unwrap();
        let back = owned_from_dynamic_image(&decoded).unwrap();
        assert_eq!(back, owned);
    }

    #[test]
    fn decode_screen_rejects_garbage() {
        assert!(decode_screen(b"not an image").is_err());
    }
}
