use crate::definitions::PROGRESS_DONE;

/// Progress reporting and cancellation for a duplicate search.
///
/// Both hooks are polled by the search on the caller's thread. The progress callback receives
/// percentages in `[0, 100]` that never decrease, and the last value of every run (cancelled or not)
/// is exactly 100. The stop predicate is checked once per directory entry during discovery and once
/// per file while hashing or extracting features.
///
/// ```rust
/// use std::cell::Cell;
/// use vid_dup_engine::ScanHooks;
///
/// let last = Cell::new(0);
/// let hooks = ScanHooks::new()
///     .on_progress(|pct| last.set(pct))
///     .stop_when(|| false);
/// assert_eq!(hooks.last_progress(), None);
/// ```
#[derive(Default)]
pub struct ScanHooks<'a> {
    progress: Option<Box<dyn FnMut(u8) + 'a>>,
    stop: Option<Box<dyn Fn() -> bool + 'a>>,
    last_progress: Option<u8>,
}

impl<'a> ScanHooks<'a> {
    /// Hooks that ignore progress and never cancel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `progress` with the percentage complete.
    #[must_use]
    pub fn on_progress(mut self, progress: impl FnMut(u8) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Stop the search as soon as `stop` returns true.
    #[must_use]
    pub fn stop_when(mut self, stop: impl Fn() -> bool + 'a) -> Self {
        self.stop = Some(Box::new(stop));
        self
    }

    /// The last percentage passed to the progress callback, if any.
    pub fn last_progress(&self) -> Option<u8> {
        self.last_progress
    }

    pub(crate) fn report(&mut self, pct: u8) {
        let floor = self.last_progress.unwrap_or(0);
        let pct = pct.clamp(floor, PROGRESS_DONE);
        self.last_progress = Some(pct);
        if let Some(progress) = self.progress.as_mut() {
            progress(pct);
        }
    }

    /// Report a position inside `[start, end]`, `fraction` being in `[0, 1]`.
    pub(crate) fn report_between(&mut self, start: u8, end: u8, fraction: f64) {
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        let span = f64::from(end.saturating_sub(start));
        self.report(start.saturating_add((span * fraction).floor() as u8));
    }

    pub(crate) fn finish(&mut self) {
        self.report(PROGRESS_DONE);
    }

    pub(crate) fn should_stop(&self) -> bool {
        self.stop.as_ref().is_some_and(|stop| stop())
    }
}

impl std::fmt::Debug for ScanHooks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanHooks")
            .field("progress", &self.progress.is_some())
            .field("stop", &self.stop.is_some())
            .field("last_progress", &self.last_progress)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};

    use super::*;

    #[test]
    fn test_progress_never_decreases() {
        let seen = RefCell::new(vec![]);
        let mut hooks = ScanHooks::new().on_progress(|pct| seen.borrow_mut().push(pct));

        hooks.report(0);
        hooks.report(40);
        hooks.report(10);
        hooks.report(250);
        drop(hooks);

        assert_eq!(*seen.borrow(), vec![0, 40, 40, 100]);
    }

    #[test]
    fn test_report_between_maps_fraction() {
        let mut hooks = ScanHooks::new();

        hooks.report_between(5, 99, 0.5);
        assert_eq!(hooks.last_progress(), Some(52));

        hooks.report_between(5, 99, f64::NAN);
        assert_eq!(hooks.last_progress(), Some(52));

        hooks.report_between(5, 99, 1.0);
        assert_eq!(hooks.last_progress(), Some(99));
    }

    #[test]
    fn test_stop_predicate_is_polled() {
        let stop = Cell::new(false);
        let hooks = ScanHooks::new().stop_when(|| stop.get());

        assert!(!hooks.should_stop());
        stop.set(true);
        assert!(hooks.should_stop());
        assert!(!ScanHooks::new().should_stop());
    }
}
