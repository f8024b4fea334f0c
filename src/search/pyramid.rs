//! Scale pyramid phase: best placement over a descending scale schedule.

use crate::debug::{BoxPx, DebugDump};
use crate::image::resize::resize_to_width;
use crate::image::OwnedImage;
use crate::kernel::Correlator;
use crate::search::MatchConfig;
use crate::template::TemplatePlan;
use crate::trace::trace_debug;
use crate::util::ScreenMatchResult;

/// Linearly spaced scale factors visited from largest to smallest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleSchedule {
    pub min_scale: f64,
    pub max_scale: f64,
    pub steps: usize,
}

impl Default for ScaleSchedule {
    fn default() -> Self {
        Self {
            min_scale: 0.2,
            max_scale: 1.0,
            steps: 20,
        }
    }
}

impl ScaleSchedule {
    /// A schedule that only evaluates the source at native size.
    pub fn native_only() -> Self {
        Self {
            min_scale: 1.0,
            max_scale: 1.0,
            steps: 1,
        }
    }

    /// Yields the scale factors in descending order, endpoints included.
    pub fn iter_desc(&self) -> impl Iterator<Item = f64> + '_ {
        let steps = self.steps;
        (0..steps).rev().map(move |i| {
            if steps == 1 || i + 1 == steps {
                self.max_scale
            } else {
                self.min_scale + (self.max_scale - self.min_scale) * i as f64 / (steps - 1) as f64
            }
        })
    }
}

/// Best placement found by the pyramid phase.
#[derive(Debug)]
pub(crate) struct ScaleHit {
    pub(crate) score: f32,
    pub(crate) x: usize,
    pub(crate) y: usize,
    /// `source_width / resized_width`, maps resized coordinates to the source.
    pub(crate) ratio: f64,
    pub(crate) resized: OwnedImage,
}

/// A scale whose resized image still contains the template.
#[derive(Clone, Copy, Debug)]
struct RetainedScale {
    scale: f64,
    width: usize,
    height: usize,
}

/// Collects scales until the resized source is smaller than the template.
fn retained_scales(
    source: &OwnedImage,
    template: &TemplatePlan,
    cfg: &MatchConfig,
) -> Vec<RetainedScale> {
    let mut out = Vec::new();
    for scale in cfg.schedule.iter_desc() {
        let width = (source.width() as f64 * scale) as usize;
        let height = if width == 0 {
            0
        } else {
            (source.height() as f64 * (width as f64 / source.width() as f64)) as usize
        };
        if width < template.width() || height < template.height() {
            break;
        }
        out.push(RetainedScale {
            scale,
            width,
            height,
        });
    }
    out
}

fn evaluate_scale<C: Correlator + ?Sized>(
    source: &OwnedImage,
    template: &TemplatePlan,
    cfg: &MatchConfig,
    correlator: &C,
    retained: RetainedScale,
    debug: Option<&DebugDump>,
) -> ScreenMatchResult<Option<ScaleHit>> {
    let resized = resize_to_width(source, retained.width)?;
    debug_assert_eq!(resized.height(), retained.height);
    let map = correlator.correlate(resized.view(), template, cfg.method)?;
    let Some((score, (x, y))) = map.max_loc() else {
        return Ok(None);
    };
    trace_debug!("scale_evaluated", scale = retained.scale, score = score);
    if score <= cfg.threshold {
        return Ok(None);
    }

    if let Some(dump) = debug {
        let tag = format!("{}", (score * 100.0) as i32);
        dump.boxed(
            &tag,
            &resized,
            &[BoxPx {
                x,
                y,
                width: template.width(),
                height: template.height(),
            }],
        );
    }

    Ok(Some(ScaleHit {
        score,
        x,
        y,
        ratio: source.width() as f64 / resized.width() as f64,
        resized,
    }))
}

/// Keeps the incumbent unless the candidate is strictly better.
fn keep_best(best: Option<ScaleHit>, candidate: Option<ScaleHit>) -> Option<ScaleHit> {
    match (best, candidate) {
        (Some(b), Some(c)) if c.score > b.score => Some(c),
        (Some(b), _) => Some(b),
        (None, c) => c,
    }
}

/// Sequential pyramid search, largest scale first.
pub(crate) fn search_scales<C: Correlator + ?Sized>(
    source: &OwnedImage,
    template: &TemplatePlan,
    cfg: &MatchConfig,
    correlator: &C,
    debug: Option<&DebugDump>,
) -> ScreenMatchResult<Option<ScaleHit>> {
    let mut best = None;
    for retained in retained_scales(source, template, cfg) {
        let hit = evaluate_scale(source, template, cfg, correlator, retained, debug)?;
        best = keep_best(best, hit);
    }
    Ok(best)
}

/// Pyramid search with scales evaluated on the rayon pool.
///
/// Results are reduced in schedule order, so ties resolve exactly as in
/// [`search_scales`].
#[cfg(feature = "rayon")]
pub(crate) fn search_scales_par<C: Correlator + ?Sized>(
    source: &OwnedImage,
    template: &TemplatePlan,
    cfg: &MatchConfig,
    correlator: &C,
    debug: Option<&DebugDump>,
) -> ScreenMatchResult<Option<ScaleHit>> {
    use rayon::prelude::*;

    let hits: Vec<ScreenMatchResult<Option<ScaleHit>>> = retained_scales(source, template, cfg)
        .into_par_iter()
        .map(|retained| evaluate_scale(source, template, cfg, correlator, retained, debug))
        .collect();

    let mut best = None;
    for hit in hits {
        best = keep_best(best, hit?);
    }
    Ok(best)
}

#[cfg(not(feature = "rayon"))]
pub(crate) fn search_scales_par<C: Correlator + ?Sized>(
    source: &OwnedImage,
    template: &TemplatePlan,
    cfg: &MatchConfig,
    correlator: &C,
    debug: Option<&DebugDump>,
) -> ScreenMatchResult<Option<ScaleHit>> {
    search_scales(source, template, cfg, correlator, debug)
}
