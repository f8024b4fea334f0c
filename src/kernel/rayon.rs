//! Rayon-parallel correlator (feature-gated).
//!
//! Placement rows are scored independently on the rayon pool and
//! concatenated in order, so the score map is identical to the scalar one.

use crate::image::ImageView;
use crate::kernel::scalar::{score_row, WindowSums};
use crate::kernel::{placement_dims, Correlator, Method, ScoreMap};
use crate::template::TemplatePlan;
use crate::util::ScreenMatchResult;
use rayon::prelude::*;

/// Row-parallel correlator.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParallelCorrelator;

impl Correlator for ParallelCorrelator {
    fn correlate(
        &self,
        image: ImageView<'_, u8>,
        template: &TemplatePlan,
        method: Method,
    ) -> ScreenMatchResult<ScoreMap> {
        let (cols, rows) = placement_dims(image, template)?;
        let sums = WindowSums::new(image);

        let row_scores: Vec<Vec<f32>> = (0..rows)
            .into_par_iter()
            .map(|y| {
                let mut row = Vec::with_capacity(cols);
                score_row(image, template, &sums, method, y, cols, &mut row);
                row
            })
            .collect();

        let mut scores = Vec::with_capacity(cols * rows);
        for row in row_scores {
            scores.extend(row);
        }
        Ok(ScoreMap::new(cols, rows, scores))
    }
}
