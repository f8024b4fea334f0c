//! Correlation kernels.
//!
//! The search engine only talks to the [`Correlator`] trait; the scalar
//! kernel is the reference implementation and the rayon kernel parallelizes
//! it over rows.

use crate::image::ImageView;
use crate::template::TemplatePlan;
use crate::util::{ScreenMatchError, ScreenMatchResult};

pub mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;

/// Similarity metric evaluated at every template placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Normalized correlation coefficient (zero-mean), in `[-1, 1]`.
    #[default]
    CcoeffNormed,
    /// Normalized cross-correlation, in `[0, 1]` for non-negative images.
    CcorrNormed,
    /// Normalized squared difference, in `[0, 1]`.
    ///
    /// Lower is better, but scores are compared against the threshold and
    /// maximized exactly like the other methods.
    SqdiffNormed,
}

/// Dense score map over every valid top-left placement.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreMap {
    width: usize,
    height: usize,
    scores: Vec<f32>,
}

impl ScoreMap {
    pub(crate) fn new(width: usize, height: usize, scores: Vec<f32>) -> Self {
        debug_assert_eq!(scores.len(), width * height);
        Self {
            width,
            height,
            scores,
        }
    }

    /// Number of placement columns (`image_width - template_width + 1`).
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of placement rows (`image_height - template_height + 1`).
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the score at placement `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores.get(y * self.width + x).copied()
    }

    /// Returns the global maximum and its `(x, y)` placement.
    ///
    /// The first maximum in row-major order wins ties.
    pub fn max_loc(&self) -> Option<(f32, (usize, usize))> {
        let mut best: Option<(f32, usize)> = None;
        for (idx, &score) in self.scores.iter().enumerate() {
            if !score.is_finite() {
                continue;
            }
            match best {
                Some((best_score, _)) if score <= best_score => {}
                _ => best = Some((score, idx)),
            }
        }
        best.map(|(score, idx)| (score, (idx % self.width, idx / self.width)))
    }
}

/// Computes score maps for a template over an image.
///
/// Implementations must be shareable across threads so that pyramid scales
/// can be evaluated in parallel.
pub trait Correlator: Sync {
    fn correlate(
        &self,
        image: ImageView<'_, u8>,
        template: &TemplatePlan,
        method: Method,
    ) -> ScreenMatchResult<ScoreMap>;
}

/// Returns the placement grid size, or an error if the template does not fit.
pub(crate) fn placement_dims(
    image: ImageView<'_, u8>,
    template: &TemplatePlan,
) -> ScreenMatchResult<(usize, usize)> {
    if !image.fits(template.width(), template.height()) {
        return Err(ScreenMatchError::TemplateLargerThanImage {
            tpl_width: template.width(),
            tpl_height: template.height(),
            img_width: image.width(),
            img_height: image.height(),
        });
    }
    Ok((
        image.width() - template.width() + 1,
        image.height() - template.height() + 1,
    ))
}
