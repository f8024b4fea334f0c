//! Multi-scale occurrence search.
//!
//! A search runs in two phases. The pyramid phase resizes the screen over a
//! descending scale schedule and keeps the single best placement above the
//! threshold. The extraction phase stays at that scale and repeatedly blanks
//! the last match and re-correlates to recover further occurrences.

pub(crate) mod extract;
pub(crate) mod order;
pub(crate) mod pyramid;

pub use order::DisposalPolicy;
pub use pyramid::ScaleSchedule;

use crate::debug::DebugDump;
use crate::image::OwnedImage;
use crate::kernel::scalar::ScalarCorrelator;
use crate::kernel::{Correlator, Method};
use crate::template::TemplatePlan;
use crate::trace::{trace_event, trace_span};
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Default number of occurrences extracted per template variant.
pub const DEFAULT_MAX_OCCURRENCES: usize = 16;

/// Default minimum similarity.
pub const DEFAULT_SIMILARITY: f32 = 0.7;

/// One occurrence of a template in source-image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Center column of the matched box.
    pub center_x: u32,
    /// Center row of the matched box.
    pub center_y: u32,
    /// Box width in source pixels.
    pub width: u32,
    /// Box height in source pixels.
    pub height: u32,
    /// Correlation score at the match.
    pub similarity: f32,
}

impl Match {
    /// Left edge of the matched box.
    pub fn left(&self) -> u32 {
        self.center_x.saturating_sub(self.width / 2)
    }

    /// Top edge of the matched box.
    pub fn top(&self) -> u32 {
        self.center_y.saturating_sub(self.height / 2)
    }
}

/// Search parameters shared by the pyramid and extraction phases.
#[derive(Clone, Debug)]
pub struct MatchConfig {
    /// Scores must be strictly greater than this to count as a match.
    pub threshold: f32,
    /// Similarity metric.
    pub method: Method,
    /// Upper bound on occurrences returned for one template.
    pub max_occurrences: usize,
    /// Scale factors visited by the pyramid phase.
    pub schedule: ScaleSchedule,
    /// Evaluate pyramid scales in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY,
            method: Method::default(),
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            schedule: ScaleSchedule::default(),
            parallel: false,
        }
    }
}

impl MatchConfig {
    /// Rejects thresholds outside `[0, 1)`, NaN included.
    pub fn validate(&self) -> ScreenMatchResult<()> {
        if !(0.0..1.0).contains(&self.threshold) {
            return Err(ScreenMatchError::InvalidThreshold {
                value: self.threshold,
            });
        }
        Ok(())
    }
}

/// Finds every occurrence of a template in a screen image.
pub struct Matcher<C = ScalarCorrelator> {
    correlator: C,
    cfg: MatchConfig,
}

impl Matcher<ScalarCorrelator> {
    /// Creates a matcher using the scalar correlator and default parameters.
    pub fn scalar() -> Self {
        Self::new(ScalarCorrelator)
    }
}

impl<C: Correlator> Matcher<C> {
    pub fn new(correlator: C) -> Self {
        Self {
            correlator,
            cfg: MatchConfig::default(),
        }
    }

    /// Replaces the search parameters.
    pub fn with_config(mut self, cfg: MatchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn config(&self) -> &MatchConfig {
        &self.cfg
    }

    pub fn correlator(&self) -> &C {
        &self.correlator
    }

    /// Returns the occurrences of `template` in `screen`, best first.
    ///
    /// An empty vector means the template was not found at any scale.
    pub fn find_all(
        &self,
        screen: &OwnedImage,
        template: &TemplatePlan,
    ) -> ScreenMatchResult<Vec<Match>> {
        self.find_all_with_debug(screen, template, None)
    }

    pub(crate) fn find_all_with_debug(
        &self,
        screen: &OwnedImage,
        template: &TemplatePlan,
        debug: Option<&DebugDump>,
    ) -> ScreenMatchResult<Vec<Match>> {
        let _span = trace_span!(
            "find_all",
            tpl_width = template.width(),
            tpl_height = template.height()
        )
        .entered();
        self.cfg.validate()?;

        if self.cfg.max_occurrences == 0 {
            return Ok(Vec::new());
        }

        let hit = if self.cfg.parallel {
            pyramid::search_scales_par(screen, template, &self.cfg, &self.correlator, debug)?
        } else {
            pyramid::search_scales(screen, template, &self.cfg, &self.correlator, debug)?
        };
        let Some(hit) = hit else {
            trace_event!("template_not_found", threshold = self.cfg.threshold);
            return Ok(Vec::new());
        };

        let matches =
            extract::extract_occurrences(hit, template, &self.cfg, &self.correlator, screen, debug)?;
        trace_event!("occurrences_found", count = matches.len());
        Ok(matches)
    }
}
