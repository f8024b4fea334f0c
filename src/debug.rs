//! Debug image dumps.
//!
//! When enabled on a query, intermediate images are written as PNG files
//! named `screenmatch_{micros}__{name}__{tag}.png`. Write failures are logged
//! and otherwise ignored; dumps never change search results.

use crate::image::io::gray_image_from_owned;
use crate::image::OwnedImage;
use crate::trace::trace_warn;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Axis-aligned box in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxPx {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Writes debug images for one element into a directory.
#[derive(Clone, Debug)]
pub struct DebugDump {
    dir: PathBuf,
    name: String,
}

impl DebugDump {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Directory the images are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `img` as-is.
    pub fn gray(&self, tag: &str, img: &OwnedImage) {
        match gray_image_from_owned(img) {
            Ok(gray) => self.save(tag, &DynamicImage::ImageLuma8(gray)),
            Err(err) => {
                trace_warn!("debug_dump_failed", tag = tag, error = err.to_string().as_str());
            }
        }
    }

    /// Writes `img` with every box outlined.
    pub fn boxed(&self, tag: &str, img: &OwnedImage, boxes: &[BoxPx]) {
        let gray = match gray_image_from_owned(img) {
            Ok(gray) => gray,
            Err(err) => {
                trace_warn!("debug_dump_failed", tag = tag, error = err.to_string().as_str());
                return;
            }
        };
        let mut canvas: RgbImage = DynamicImage::ImageLuma8(gray).to_rgb8();
        for b in boxes {
            if b.width == 0 || b.height == 0 {
                continue;
            }
            let rect = Rect::at(b.x as i32, b.y as i32).of_size(b.width as u32, b.height as u32);
            draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);
        }
        self.save(tag, &DynamicImage::ImageRgb8(canvas));
    }

    fn path_for(&self, tag: &str) -> PathBuf {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros())
            .unwrap_or_default();
        self.dir
            .join(format!("screenmatch_{micros}__{}__{tag}.png", self.name))
    }

    fn save(&self, tag: &str, img: &DynamicImage) {
        if let Err(err) = fs::create_dir_all(&self.dir) {
            trace_warn!("debug_dump_failed", tag = tag, error = err.to_string().as_str());
            return;
        }
        let path = self.path_for(tag);
        if let Err(err) = img.save(&path) {
            trace_warn!("debug_dump_failed", tag = tag, error = err.to_string().as_str());
        }
    }
}
