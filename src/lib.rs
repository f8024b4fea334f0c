//! screenmatch locates a template image inside a captured screen at unknown
//! scale and reports every occurrence with its position and score.
//!
//! The engine searches a descending scale pyramid for the best placement,
//! then blanks each match and re-correlates to recover further
//! non-overlapping occurrences. [`ElementQuery`] ties this to template files
//! and screen capture; [`TrackedElement`] adds result caching and
//! visibility waits for UI automation.
//!
//! Parallel scale evaluation is available with the `rayon` feature and
//! structured logging with the `tracing` feature.

pub mod debug;
pub mod image;
pub mod kernel;
pub mod query;
pub mod search;
pub mod template;
mod trace;
pub mod util;

pub use crate::image::{ImageView, OwnedImage};
pub use kernel::scalar::ScalarCorrelator;
pub use kernel::{Correlator, Method, ScoreMap};
pub use query::{
    activate, CancelToken, ElementQuery, FileScreen, GlobResolver, PollSchedule, PollState,
    QueryConfig, ScreenSource, SearchResult, StaticScreen, TapDispatcher, TemplateResolver,
    TrackedElement, Visibility, VisibilityPoller,
};
pub use search::{DisposalPolicy, Match, MatchConfig, Matcher, ScaleSchedule};
pub use template::{Template, TemplatePlan};
pub use util::{ScreenMatchError, ScreenMatchResult};

#[cfg(feature = "rayon")]
pub use kernel::rayon::ParallelCorrelator;
