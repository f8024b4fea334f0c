//! Element queries: template patterns resolved, searched and ranked.
//!
//! [`ElementQuery`] is immutable; [`ElementQuery::search`] returns a fresh
//! [`SearchResult`] every time. [`TrackedElement`] owns the most recent result
//! and offers the cached accessors and visibility waits.

mod poll;
mod source;
mod tracked;

pub use poll::{CancelToken, PollSchedule, PollState, Visibility, VisibilityPoller};
pub use source::{
    FileScreen, GlobResolver, ScreenSource, StaticScreen, TapDispatcher, TemplateResolver,
};
pub use tracked::TrackedElement;

use crate::debug::DebugDump;
use crate::image::io::owned_from_dynamic_image;
use crate::image::OwnedImage;
use crate::kernel::scalar::ScalarCorrelator;
use crate::kernel::{Correlator, Method};
use crate::search::{
    DisposalPolicy, Match, MatchConfig, Matcher, ScaleSchedule, DEFAULT_MAX_OCCURRENCES,
    DEFAULT_SIMILARITY,
};
use crate::template::Template;
use crate::trace::{trace_event, trace_span};
use crate::util::name::name_from_pattern;
use crate::util::{ScreenMatchError, ScreenMatchResult};
use std::path::PathBuf;

/// Configuration of one UI element.
#[derive(Clone, Debug)]
pub struct QueryConfig {
    /// Path or glob pattern of the template variants.
    pub template_source: String,
    /// Diagnostic name; derived from the pattern's file stem when `None`.
    pub name: Option<String>,
    /// Which ranked match [`SearchResult::selected`] returns.
    pub order_index: usize,
    pub disposal: DisposalPolicy,
    /// Minimum similarity, in `[0, 1)`.
    pub similarity: f32,
    pub method: Method,
    /// Cap on occurrences per template variant and on the merged result.
    pub max_occurrences: usize,
    pub schedule: ScaleSchedule,
    /// Evaluate pyramid scales in parallel (requires the `rayon` feature).
    pub parallel: bool,
    /// Directory for debug image dumps; disabled when `None`.
    pub debug_dir: Option<PathBuf>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            template_source: String::new(),
            name: None,
            order_index: 0,
            disposal: DisposalPolicy::default(),
            similarity: DEFAULT_SIMILARITY,
            method: Method::default(),
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            schedule: ScaleSchedule::default(),
            parallel: false,
            debug_dir: None,
        }
    }
}

impl QueryConfig {
    /// Default configuration for a template path or glob pattern.
    pub fn new(template_source: impl Into<String>) -> Self {
        Self {
            template_source: template_source.into(),
            ..Self::default()
        }
    }

    /// Checks the invariants every search relies on.
    pub fn validate(&self) -> ScreenMatchResult<()> {
        self.match_config().validate()?;
        if self.order_index >= self.max_occurrences {
            return Err(ScreenMatchError::OrderAboveMaxOccurrences {
                order: self.order_index,
                max_occurrences: self.max_occurrences,
            });
        }
        Ok(())
    }

    fn match_config(&self) -> MatchConfig {
        MatchConfig {
            threshold: self.similarity,
            method: self.method,
            max_occurrences: self.max_occurrences,
            schedule: self.schedule,
            parallel: self.parallel,
        }
    }
}

/// Ordered occurrences of one element on one captured screen.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    name: String,
    order_index: usize,
    matches: Vec<Match>,
}

impl SearchResult {
    /// Name of the element this result belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// True iff at least one occurrence was found.
    pub fn is_visible(&self) -> bool {
        !self.matches.is_empty()
    }

    /// Returns the `index`-th ranked match.
    pub fn get(&self, index: usize) -> ScreenMatchResult<&Match> {
        self.matches
            .get(index)
            .ok_or_else(|| ScreenMatchError::IndexOutOfRange {
                name: self.name.clone(),
                index,
                found: self.matches.len(),
            })
    }

    /// Returns the match at the configured order index.
    pub fn selected(&self) -> ScreenMatchResult<&Match> {
        self.get(self.order_index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }

    pub fn into_matches(self) -> Vec<Match> {
        self.matches
    }
}

impl<'a> IntoIterator for &'a SearchResult {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

/// Taps the center of `m`.
pub fn activate<D: TapDispatcher + ?Sized>(m: &Match, dispatcher: &mut D) -> ScreenMatchResult<()> {
    trace_event!("activate", x = m.center_x, y = m.center_y);
    dispatcher.dispatch_tap(m.center_x, m.center_y)
}

/// Searches a screen for every variant of one element.
pub struct ElementQuery<C = ScalarCorrelator, R = GlobResolver> {
    cfg: QueryConfig,
    name: String,
    matcher: Matcher<C>,
    resolver: R,
}

impl ElementQuery {
    /// Query using the scalar correlator and filesystem glob resolution.
    pub fn new(cfg: QueryConfig) -> Self {
        Self::with_parts(cfg, ScalarCorrelator, GlobResolver)
    }
}

impl<C: Correlator, R: TemplateResolver> ElementQuery<C, R> {
    pub fn with_parts(cfg: QueryConfig, correlator: C, resolver: R) -> Self {
        let name = cfg
            .name
            .clone()
            .unwrap_or_else(|| name_from_pattern(&cfg.template_source));
        let matcher = Matcher::new(correlator).with_config(cfg.match_config());
        Self {
            cfg,
            name,
            matcher,
            resolver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &QueryConfig {
        &self.cfg
    }

    pub fn correlator(&self) -> &C {
        self.matcher.correlator()
    }

    /// Enables debug dumps into `dir`, or disables them with `None`.
    pub fn set_debug(&mut self, dir: Option<PathBuf>) -> &mut Self {
        self.cfg.debug_dir = dir;
        self
    }

    /// Resolves the templates, captures the screen and searches it.
    ///
    /// The screen is captured once and shared by every template variant. It
    /// is not captured when the pattern resolves to no files.
    pub fn search<S: ScreenSource + ?Sized>(
        &self,
        screen: &mut S,
    ) -> ScreenMatchResult<SearchResult> {
        let _span = trace_span!("element_search", element = self.name.as_str()).entered();
        self.cfg.validate()?;

        let paths = self.resolver.resolve(&self.cfg.template_source)?;
        if paths.is_empty() {
            trace_event!("no_templates", element = self.name.as_str());
            return Ok(self.finish(Vec::new()));
        }

        let mut templates = Vec::with_capacity(paths.len());
        for path in paths {
            if !path.is_file() {
                return Err(ScreenMatchError::TemplateMissing { path });
            }
            templates.push(Template::load(&path)?);
        }

        let captured = owned_from_dynamic_image(&screen.capture_screen()?)?;
        self.search_templates(&captured, &templates)
    }

    /// Searches an already captured grayscale screen for the given variants.
    pub fn search_templates(
        &self,
        screen: &OwnedImage,
        templates: &[Template],
    ) -> ScreenMatchResult<SearchResult> {
        self.cfg.validate()?;

        let debug = self
            .cfg
            .debug_dir
            .as_ref()
            .map(|dir| DebugDump::new(dir, self.name.as_str()));
        if let Some(dump) = &debug {
            dump.gray("screenshot", screen);
        }

        let mut matches = Vec::new();
        for template in templates {
            let plan = template.plan()?;
            let found = self
                .matcher
                .find_all_with_debug(screen, &plan, debug.as_ref())?;
            matches.extend(found);
        }

        self.cfg.disposal.sort(&mut matches);
        matches.truncate(self.cfg.max_occurrences);
        trace_event!(
            "element_searched",
            element = self.name.as_str(),
            count = matches.len()
        );
        Ok(self.finish(matches))
    }

    fn finish(&self, matches: Vec<Match>) -> SearchResult {
        SearchResult {
            name: self.name.clone(),
            order_index: self.cfg.order_index,
            matches,
        }
    }
}
