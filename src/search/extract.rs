//! Extraction phase: blank the last match and re-correlate.
//!
//! Occurrences are assumed not to overlap. An occurrence overlapping an
//! earlier one is partially blanked and usually falls below the threshold.

use crate::debug::{BoxPx, DebugDump};
use crate::image::OwnedImage;
use crate::kernel::Correlator;
use crate::search::pyramid::ScaleHit;
use crate::search::{Match, MatchConfig};
use crate::template::TemplatePlan;
use crate::trace::trace_debug;
use crate::util::ScreenMatchResult;

/// Value written over a matched region before the next correlation.
pub(crate) const BLANK: u8 = 0;

/// Source-pixel bounds `(x0, y0, x1, y1)` of a placement at the hit's scale.
fn source_bounds(x: usize, y: usize, template: &TemplatePlan, ratio: f64) -> (u32, u32, u32, u32) {
    let scale = |v: usize| (v as f64 * ratio) as u32;
    (
        scale(x),
        scale(y),
        scale(x + template.width()),
        scale(y + template.height()),
    )
}

fn to_match(x: usize, y: usize, score: f32, template: &TemplatePlan, ratio: f64) -> Match {
    let (x0, y0, x1, y1) = source_bounds(x, y, template, ratio);
    let width = x1 - x0;
    let height = y1 - y0;
    Match {
        center_x: x0 + width / 2,
        center_y: y0 + height / 2,
        width,
        height,
        similarity: score,
    }
}

fn to_box(m: &Match) -> BoxPx {
    BoxPx {
        x: m.left() as usize,
        y: m.top() as usize,
        width: m.width as usize,
        height: m.height as usize,
    }
}

/// Expands the pyramid hit into up to `max_occurrences` matches.
pub(crate) fn extract_occurrences<C: Correlator + ?Sized>(
    hit: ScaleHit,
    template: &TemplatePlan,
    cfg: &MatchConfig,
    correlator: &C,
    screen: &OwnedImage,
    debug: Option<&DebugDump>,
) -> ScreenMatchResult<Vec<Match>> {
    let ScaleHit {
        score,
        mut x,
        mut y,
        ratio,
        mut resized,
    } = hit;

    let first = to_match(x, y, score, template, ratio);
    if let Some(dump) = debug {
        dump.boxed("best", screen, &[to_box(&first)]);
    }

    let mut matches = vec![first];
    let mut round = 0usize;
    while matches.len() < cfg.max_occurrences {
        resized.fill_rect(x, y, template.width(), template.height(), BLANK);
        if let Some(dump) = debug {
            dump.gray(&format!("covered_{round}"), &resized);
        }
        round += 1;

        let map = correlator.correlate(resized.view(), template, cfg.method)?;
        let Some((score, (nx, ny))) = map.max_loc() else {
            break;
        };
        trace_debug!("extract_round", round = round, score = score);
        if score <= cfg.threshold {
            break;
        }
        x = nx;
        y = ny;
        matches.push(to_match(x, y, score, template, ratio));
    }

    if let Some(dump) = debug {
        let boxes: Vec<BoxPx> = matches.iter().map(to_box).collect();
        dump.boxed("all", screen, &boxes);
    }
    Ok(matches)
}
