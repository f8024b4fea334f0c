//! Collaborator seams: screen capture, tap dispatch and template resolution.

use crate::util::{ScreenMatchError, ScreenMatchResult};
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Produces the current screen as a decoded raster image.
pub trait ScreenSource {
    fn capture_screen(&mut self) -> ScreenMatchResult<DynamicImage>;
}

impl<F> ScreenSource for F
where
    F: FnMut() -> ScreenMatchResult<DynamicImage>,
{
    fn capture_screen(&mut self) -> ScreenMatchResult<DynamicImage> {
        self()
    }
}

/// A screen that always returns the same image.
#[derive(Clone, Debug)]
pub struct StaticScreen {
    image: DynamicImage,
}

impl StaticScreen {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Replaces the image returned by later captures.
    pub fn set(&mut self, image: DynamicImage) {
        self.image = image;
    }
}

impl ScreenSource for StaticScreen {
    fn capture_screen(&mut self) -> ScreenMatchResult<DynamicImage> {
        Ok(self.image.clone())
    }
}

/// A screen read from an image file on every capture.
#[derive(Clone, Debug)]
pub struct FileScreen {
    path: PathBuf,
}

impl FileScreen {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScreenSource for FileScreen {
    fn capture_screen(&mut self) -> ScreenMatchResult<DynamicImage> {
        image::open(&self.path).map_err(|err| ScreenMatchError::Capture {
            reason: format!("{}: {err}", self.path.display()),
        })
    }
}

/// Performs a tap at source-image pixel coordinates.
pub trait TapDispatcher {
    fn dispatch_tap(&mut self, x: u32, y: u32) -> ScreenMatchResult<()>;
}

impl<F> TapDispatcher for F
where
    F: FnMut(u32, u32) -> ScreenMatchResult<()>,
{
    fn dispatch_tap(&mut self, x: u32, y: u32) -> ScreenMatchResult<()> {
        self(x, y)
    }
}

/// Turns a template pattern into concrete template files.
pub trait TemplateResolver {
    fn resolve(&self, pattern: &str) -> ScreenMatchResult<Vec<PathBuf>>;
}

/// Filesystem glob resolution.
///
/// A pattern without glob metacharacters names one file, which must exist.
/// A glob that matches nothing resolves to an empty list.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlobResolver;

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

impl TemplateResolver for GlobResolver {
    fn resolve(&self, pattern: &str) -> ScreenMatchResult<Vec<PathBuf>> {
        if !has_glob_meta(pattern) {
            let path = PathBuf::from(pattern);
            if !path.is_file() {
                return Err(ScreenMatchError::TemplateMissing { path });
            }
            return Ok(vec![path]);
        }

        let entries = glob::glob(pattern).map_err(|err| ScreenMatchError::Resolve {
            reason: err.to_string(),
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry.map_err(|err| ScreenMatchError::Resolve {
                reason: err.to_string(),
            })?);
        }
        Ok(paths)
    }
}
