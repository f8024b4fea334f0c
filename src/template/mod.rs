//! Template storage and correlation plans.

use crate::image::io::load_gray_image;
use crate::image::{ImageView, OwnedImage};
use crate::util::ScreenMatchResult;
use std::path::{Path, PathBuf};

mod plan;

pub use plan::TemplatePlan;

/// Owned template image in contiguous grayscale format.
pub struct Template {
    img: OwnedImage,
    source: Option<PathBuf>,
}

impl Template {
    /// Creates a template from a contiguous grayscale buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> ScreenMatchResult<Self> {
        let img = OwnedImage::new(data, width, height)?;
        Ok(Self { img, source: None })
    }

    /// Creates a template from an already decoded grayscale image.
    pub fn from_image(img: OwnedImage) -> Self {
        Self { img, source: None }
    }

    /// Loads a template file and converts it to grayscale.
    pub fn load<P: AsRef<Path>>(path: P) -> ScreenMatchResult<Self> {
        let path = path.as_ref();
        let img = load_gray_image(path)?;
        Ok(Self {
            img,
            source: Some(path.to_path_buf()),
        })
    }

    /// Returns the file this template was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn width(&self) -> usize {
        self.img.width()
    }

    pub fn height(&self) -> usize {
        self.img.height()
    }

    /// Returns a borrowed view of the template data.
    pub fn view(&self) -> ImageView<'_, u8> {
        self.img.view()
    }

    /// Precomputes the statistics used by the correlation kernels.
    pub fn plan(&self) -> ScreenMatchResult<TemplatePlan> {
        TemplatePlan::from_view(self.view())
    }
}
