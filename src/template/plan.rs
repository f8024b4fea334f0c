//! Template plan precomputation for the normalized correlation methods.

use crate::image::ImageView;
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Precomputed template buffers and energies.
///
/// One plan serves every [`Method`](crate::Method): the raw buffer feeds the
/// cross-correlation and squared-difference scores, the zero-mean buffer
/// feeds the correlation-coefficient score.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f32,
    raw: Vec<f32>,
    zero_mean: Vec<f32>,
    sum_sq: f64,
    var_sum: f64,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    pub fn from_view(tpl: ImageView<'_, u8>) -> ScreenMatchResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;

        let mut raw = Vec::with_capacity(count);
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(ScreenMatchError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: y * tpl.stride(),
            })?;
            for &value in row {
                let v = f64::from(value);
                sum += v;
                sum_sq += v * v;
                raw.push(value as f32);
            }
        }

        let mean_f64 = sum / count as f64;
        let var_sum = (sum_sq - sum * mean_f64).max(0.0);
        let mean = mean_f64 as f32;
        let zero_mean = raw.iter().map(|&v| v - mean).collect();

        Ok(Self {
            width,
            height,
            mean,
            raw,
            zero_mean,
            sum_sq,
            var_sum,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the mean intensity of the template.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Returns the template pixels as `f32` in row-major order.
    pub fn raw(&self) -> &[f32] {
        &self.raw
    }

    /// Returns the zero-mean template buffer in row-major order.
    pub fn zero_mean(&self) -> &[f32] {
        &self.zero_mean
    }

    /// Sum of squared pixel values.
    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// Sum of squared deviations from the mean.
    pub fn var_sum(&self) -> f64 {
        self.var_sum
    }
}
