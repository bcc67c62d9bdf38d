//! Polling waits for elements to appear or disappear.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::model::Match;
use crate::search::{LocateRequest, MatchLocator};
use crate::trace::{trace_event, trace_span};
use crate::util::ScreenLocResult;

/// Cooperative cancellation flag for wait operations.
///
/// Clones share the flag. A cancelled wait returns its "not found" result.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl MatchLocator {
    /// Polls [`MatchLocator::locate`] until something is found or `timeout`
    /// elapses. A timeout returns an empty result.
    pub fn wait_for_element(
        &self,
        request: &LocateRequest,
        timeout: Duration,
    ) -> ScreenLocResult<Vec<Match>> {
        self.wait_for_element_with(request, timeout, &Cancellation::new())
    }

    /// [`MatchLocator::wait_for_element`] with a cancellation flag checked
    /// before every poll.
    pub fn wait_for_element_with(
        &self,
        request: &LocateRequest,
        timeout: Duration,
        cancel: &Cancellation,
    ) -> ScreenLocResult<Vec<Match>> {
        let _span = trace_span!("wait_for_element", timeout_ms = timeout.as_millis() as u64).entered();
        let deadline = self.clock.now().saturating_add(timeout);
        let mut polls = 0usize;
        loop {
            if cancel.is_cancelled() {
                trace_event!("wait_cancelled", polls = polls);
                return Ok(Vec::new());
            }
            polls += 1;
            let found = self.locate(request)?;
            if !found.is_empty() {
                trace_event!("wait_found", polls = polls, matches = found.len());
                return Ok(found);
            }
            if !self.sleep_until_next_poll(deadline) {
                trace_event!("wait_timeout", polls = polls);
                return Ok(Vec::new());
            }
        }
    }

    /// Polls [`MatchLocator::verify_element`] until the element is gone or
    /// `timeout` elapses. Returns `true` only if it was confirmed absent.
    pub fn wait_for_vanish(&self, element: &Match, timeout: Duration) -> ScreenLocResult<bool> {
        self.wait_for_vanish_with(element, timeout, &Cancellation::new())
    }

    /// [`MatchLocator::wait_for_vanish`] with a cancellation flag checked
    /// before every poll.
    pub fn wait_for_vanish_with(
        &self,
        element: &Match,
        timeout: Duration,
        cancel: &Cancellation,
    ) -> ScreenLocResult<bool> {
        let _span = trace_span!("wait_for_vanish", timeout_ms = timeout.as_millis() as u64).entered();
        let deadline = self.clock.now().saturating_add(timeout);
        let mut polls = 0usize;
        loop {
            if cancel.is_cancelled() {
                trace_event!("wait_cancelled", polls = polls);
                return Ok(false);
            }
            polls += 1;
            if !self.verify_element(element)? {
                trace_event!("wait_vanished", polls = polls);
                return Ok(true);
            }
            if !self.sleep_until_next_poll(deadline) {
                trace_event!("wait_timeout", polls = polls);
                return Ok(false);
            }
        }
    }

    /// Sleeps one poll interval, cut short at `deadline`.
    ///
    /// Returns `false` once the deadline has passed.
    fn sleep_until_next_poll(&self, deadline: Duration) -> bool {
        let now = self.clock.now();
        if now >= deadline {
            return false;
        }
        self.clock.sleep(self.cfg.poll_interval.min(deadline - now));
        true
    }
}
