//! Cached element handle bound to a screen source.

use crate::kernel::scalar::ScalarCorrelator;
use crate::kernel::Correlator;
use crate::query::poll::{Visibility, VisibilityPoller};
use crate::query::source::{GlobResolver, ScreenSource, TapDispatcher, TemplateResolver};
use crate::query::{activate, ElementQuery, SearchResult};
use crate::search::Match;
use crate::util::ScreenMatchResult;
use std::time::Duration;

/// An [`ElementQuery`] plus its screen and the most recent result.
///
/// Accessors reuse the cached result until [`invalidate`](Self::invalidate)
/// is called. Not meant to be shared between threads; give each thread its
/// own handle.
pub struct TrackedElement<S, C = ScalarCorrelator, R = GlobResolver> {
    query: ElementQuery<C, R>,
    screen: S,
    last: Option<SearchResult>,
    poller: VisibilityPoller,
}

impl<S, C, R> TrackedElement<S, C, R>
where
    S: ScreenSource,
    C: Correlator,
    R: TemplateResolver,
{
    pub fn new(query: ElementQuery<C, R>, screen: S) -> Self {
        Self {
            query,
            screen,
            last: None,
            poller: VisibilityPoller::default(),
        }
    }

    /// Replaces the poller used by the visibility waits.
    pub fn with_poller(mut self, poller: VisibilityPoller) -> Self {
        self.poller = poller;
        self
    }

    pub fn query(&self) -> &ElementQuery<C, R> {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut ElementQuery<C, R> {
        &mut self.query
    }

    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    pub fn poller(&self) -> &VisibilityPoller {
        &self.poller
    }

    /// The cached result, if a search has run since the last invalidation.
    pub fn last_result(&self) -> Option<&SearchResult> {
        self.last.as_ref()
    }

    /// Drops the cached result so the next accessor searches again.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// Returns the cached result, searching first if there is none.
    pub fn result(&mut self) -> ScreenMatchResult<&SearchResult> {
        let result = match self.last.take() {
            Some(result) => result,
            None => self.query.search(&mut self.screen)?,
        };
        Ok(self.last.insert(result))
    }

    /// Invalidates and searches again.
    pub fn refresh(&mut self) -> ScreenMatchResult<&SearchResult> {
        self.invalidate();
        self.result()
    }

    pub fn matches(&mut self) -> ScreenMatchResult<&[Match]> {
        Ok(self.result()?.matches())
    }

    pub fn len(&mut self) -> ScreenMatchResult<usize> {
        Ok(self.result()?.len())
    }

    pub fn is_visible(&mut self) -> ScreenMatchResult<bool> {
        Ok(self.result()?.is_visible())
    }

    pub fn match_at(&mut self, index: usize) -> ScreenMatchResult<Match> {
        self.result()?.get(index).copied()
    }

    /// The match at the configured order index.
    pub fn selected(&mut self) -> ScreenMatchResult<Match> {
        self.result()?.selected().copied()
    }

    /// Blocks until the element is visible; the returned result is cached.
    pub fn wait_until_visible(&mut self, timeout: Duration) -> ScreenMatchResult<&SearchResult> {
        self.wait_for(Visibility::Visible, timeout)?;
        self.result()
    }

    /// Blocks until the element is no longer visible.
    pub fn wait_until_not_visible(&mut self, timeout: Duration) -> ScreenMatchResult<()> {
        self.wait_for(Visibility::NotVisible, timeout)
    }

    /// Waits for the element, then taps the selected match.
    pub fn click<D: TapDispatcher + ?Sized>(
        &mut self,
        timeout: Duration,
        dispatcher: &mut D,
    ) -> ScreenMatchResult<Match> {
        self.wait_until_visible(timeout)?;
        let target = self.selected()?;
        activate(&target, dispatcher)?;
        Ok(target)
    }

    fn wait_for(&mut self, target: Visibility, timeout: Duration) -> ScreenMatchResult<()> {
        let poller = self.poller.clone();
        let name = self.query.name().to_owned();
        poller.wait_for(&name, target, timeout, || {
            self.invalidate();
            self.is_visible()
        })?;
        Ok(())
    }
}
