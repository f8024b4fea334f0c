//! Scalar reference kernel.
//!
//! Window sums and sums of squares come from integral images, so only the
//! template dot product is evaluated per placement. Normalization follows the
//! usual normalized template-matching conventions: a score whose numerator
//! exceeds its denominator is clamped to `±1` when within 12.5%, otherwise
//! the placement is treated as degenerate (0, or 1 for squared difference).

use crate::image::ImageView;
use crate::kernel::{placement_dims, Correlator, Method, ScoreMap};
use crate::template::TemplatePlan;
use crate::util::ScreenMatchResult;

/// Single-threaded correlator.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScalarCorrelator;

impl Correlator for ScalarCorrelator {
    fn correlate(
        &self,
        image: ImageView<'_, u8>,
        template: &TemplatePlan,
        method: Method,
    ) -> ScreenMatchResult<ScoreMap> {
        let (cols, rows) = placement_dims(image, template)?;
        let sums = WindowSums::new(image);
        let mut scores = Vec::with_capacity(cols * rows);
        for y in 0..rows {
            score_row(image, template, &sums, method, y, cols, &mut scores);
        }
        Ok(ScoreMap::new(cols, rows, scores))
    }
}

/// Integral images of pixel values and squared pixel values.
pub(crate) struct WindowSums {
    stride: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

impl WindowSums {
    pub(crate) fn new(image: ImageView<'_, u8>) -> Self {
        let stride = image.width() + 1;
        let len = stride * (image.height() + 1);
        let mut sum = vec![0u64; len];
        let mut sum_sq = vec![0u64; len];
        for y in 0..image.height() {
            let row = image.row(y).expect("row within bounds for integral image");
            let mut run = 0u64;
            let mut run_sq = 0u64;
            for (x, &value) in row.iter().enumerate() {
                let v = u64::from(value);
                run += v;
                run_sq += v * v;
                let idx = (y + 1) * stride + x + 1;
                sum[idx] = sum[idx - stride] + run;
                sum_sq[idx] = sum_sq[idx - stride] + run_sq;
            }
        }
        Self {
            stride,
            sum,
            sum_sq,
        }
    }

    /// Returns `(sum, sum_sq)` over the window with top-left `(x, y)`.
    pub(crate) fn window(&self, x: usize, y: usize, width: usize, height: usize) -> (f64, f64) {
        let a = y * self.stride + x;
        let b = a + width;
        let c = (y + height) * self.stride + x;
        let d = c + width;
        let s = self.sum[d] + self.sum[a] - self.sum[b] - self.sum[c];
        let s2 = self.sum_sq[d] + self.sum_sq[a] - self.sum_sq[b] - self.sum_sq[c];
        (s as f64, s2 as f64)
    }
}

/// Appends the scores of placement row `y` to `out`.
pub(crate) fn score_row(
    image: ImageView<'_, u8>,
    template: &TemplatePlan,
    sums: &WindowSums,
    method: Method,
    y: usize,
    cols: usize,
    out: &mut Vec<f32>,
) {
    for x in 0..cols {
        out.push(score_at(image, template, sums, method, x, y));
    }
}

/// Scores a single placement with top-left corner `(x, y)`.
pub(crate) fn score_at(
    image: ImageView<'_, u8>,
    template: &TemplatePlan,
    sums: &WindowSums,
    method: Method,
    x: usize,
    y: usize,
) -> f32 {
    let tpl_width = template.width();
    let tpl_height = template.height();
    let weights = match method {
        Method::CcoeffNormed => template.zero_mean(),
        Method::CcorrNormed | Method::SqdiffNormed => template.raw(),
    };

    let mut dot = 0.0f64;
    for ty in 0..tpl_height {
        let img_row = image.row(y + ty).expect("row within bounds for score");
        let base = ty * tpl_width;
        let mut row_dot = 0.0f32;
        for tx in 0..tpl_width {
            row_dot += weights[base + tx] * img_row[x + tx] as f32;
        }
        dot += f64::from(row_dot);
    }

    let (sum_i, sum_i2) = sums.window(x, y, tpl_width, tpl_height);
    let n = (tpl_width * tpl_height) as f64;
    let (num, denom) = match method {
        Method::CcoeffNormed => {
            let var_i = (sum_i2 - sum_i * sum_i / n).max(0.0);
            (dot, (template.var_sum() * var_i).sqrt())
        }
        Method::CcorrNormed => (dot, (template.sum_sq() * sum_i2).sqrt()),
        Method::SqdiffNormed => (
            template.sum_sq() + sum_i2 - 2.0 * dot,
            (template.sum_sq() * sum_i2).sqrt(),
        ),
    };
    normalize(num, denom, method)
}

fn normalize(num: f64, denom: f64, method: Method) -> f32 {
    let magnitude = num.abs();
    if magnitude < denom {
        (num / denom) as f32
    } else if magnitude < denom * 1.125 {
        if num > 0.0 {
            1.0
        } else {
            -1.0
        }
    } else if method == Method::SqdiffNormed {
        1.0
    } else {
        0.0
    }
}
