//! Filtered reads with an adaptively sized fetch window.
//!
//! The pager scans forward from a start offset, keeps rows accepted by a
//! [`RowPredicate`], and stops once it holds the requested number of matches
//! or the dataset runs out. With dynamic growth enabled, each step estimates
//! the selectivity seen so far and sizes the next window to reach the target,
//! subject to the bounds in [`next_window`].

use crate::error::{ReadError, Result};
use crate::fetch::{Window, WindowedFetcher};
use crate::filter::RowPredicate;
use crate::source::RowSource;
use rowscope_model::Row;

/// Selectivity floor used when estimating the next window.
pub const MIN_SELECTIVITY: f64 = 0.1;
/// A window never grows by more than this factor per step.
pub const MAX_GROWTH: usize = 2;
/// A window never exceeds this multiple of the target length.
pub const MAX_TARGET_MULTIPLE: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagerRequest {
    /// First row offset to scan.
    pub start: usize,
    /// Number of matching rows wanted; `None` scans to the end of the dataset.
    pub target: Option<usize>,
    /// Window of the first fetch, and the floor for later ones.
    pub initial_window: usize,
    /// Resize the window from observed selectivity.
    pub dynamic: bool,
}

impl PagerRequest {
    /// A request whose initial window equals the target length.
    pub fn new(start: usize, target: Option<usize>) -> Self {
        Self {
            start,
            target,
            initial_window: target.unwrap_or(0),
            dynamic: false,
        }
    }

    pub fn with_initial_window(mut self, window: usize) -> Self {
        self.initial_window = window;
        self
    }

    pub fn with_dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilteredPage {
    /// Matching rows in dataset order, at most `target` of them.
    pub rows: Vec<Row>,
    /// Offset just past the last row this page accounts for. Resuming a scan
    /// here neither skips nor repeats a match.
    pub resume_at: usize,
    /// No rows remain past `resume_at`.
    pub exhausted: bool,
    /// Oracle calls made for this page.
    pub fetches: usize,
}

pub struct AdaptiveFilterPager<'f, 'a, S: ?Sized> {
    fetcher: &'f WindowedFetcher<'a, S>,
}

impl<'f, 'a, S: RowSource + ?Sized> AdaptiveFilterPager<'f, 'a, S> {
    pub fn new(fetcher: &'f WindowedFetcher<'a, S>) -> Self {
        Self { fetcher }
    }

    pub fn run(&self, predicate: &dyn RowPredicate, request: PagerRequest) -> Result<FilteredPage> {
        let records = self.fetcher.record_count();
        let start = request.start;
        if start > records {
            return Err(ReadError::invalid_range(format!(
                "start {start} is beyond the last record ({records})"
            )));
        }
        let initial = match request.target {
            Some(0) => return Err(ReadError::invalid_range("length must be positive")),
            Some(_) if request.initial_window == 0 => {
                return Err(ReadError::invalid_range("window length must be positive"))
            }
            Some(_) => request.initial_window,
            // "All remaining" becomes a concrete bound before the scan starts.
            None => Window::All.resolve(start, records),
        };

        let mut page = FilteredPage {
            resume_at: start,
            ..FilteredPage::default()
        };
        let mut cursor = start;
        let mut window = initial;

        while cursor < records {
            let request_len = window.min(records - cursor);
            let fetched = self.fetcher.fetch(cursor, Window::Rows(request_len))?;
            page.fetches += 1;
            let fetched_len = fetched.len();

            for (offset, row) in fetched.rows.into_iter().enumerate() {
                if !predicate.matches(&row) {
                    continue;
                }
                page.rows.push(row);
                if request.target.is_some_and(|t| page.rows.len() >= t) {
                    // Matches past the target in this window are dropped.
                    page.resume_at = cursor + offset + 1;
                    page.exhausted = page.resume_at >= records;
                    return Ok(page);
                }
            }

            if cursor + request_len >= records || fetched_len < request_len {
                page.resume_at = (cursor + request_len).min(records);
                page.exhausted = true;
                return Ok(page);
            }

            cursor += request_len;
            if let (true, Some(target)) = (request.dynamic, request.target) {
                let next = next_window(WindowState {
                    collected: page.rows.len(),
                    scanned: cursor - start,
                    target,
                    initial_window: initial,
                    window,
                    remaining_records: records - cursor,
                });
                log::trace!(
                    "filter window {window} -> {next} at {cursor} ({}/{target} matched)",
                    page.rows.len()
                );
                window = next;
            }
        }

        page.resume_at = cursor.min(records);
        page.exhausted = true;
        Ok(page)
    }
}

/// Inputs to [`next_window`], sampled after a non-final iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowState {
    /// Matches gathered so far.
    pub collected: usize,
    /// Rows scanned so far; always positive.
    pub scanned: usize,
    pub target: usize,
    pub initial_window: usize,
    /// Window used by the iteration that just finished.
    pub window: usize,
    /// Rows between the advanced cursor and the end of the dataset.
    pub remaining_records: usize,
}

/// Size of the next fetch window.
///
/// The estimate `ceil(still_needed / max(selectivity, MIN_SELECTIVITY))` is
/// raised to the initial window, then capped at double the previous window,
/// at `MAX_TARGET_MULTIPLE` times the target, and at the rows left.
pub fn next_window(state: WindowState) -> usize {
    let ratio = state.collected as f64 / state.scanned.max(1) as f64;
    let factor = ratio.max(MIN_SELECTIVITY);
    let needed = state.target.saturating_sub(state.collected);
    let estimate = (needed as f64 / factor).ceil() as usize;

    estimate
        .max(state.initial_window)
        .min(state.window.saturating_mul(MAX_GROWTH))
        .min(state.target.saturating_mul(MAX_TARGET_MULTIPLE))
        .min(state.remaining_records)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> WindowState {
        WindowState {
            collected: 0,
            scanned: 10,
            target: 10,
            initial_window: 10,
            window: 10,
            remaining_records: 1_000,
        }
    }

    #[test]
    fn zero_selectivity_doubles_the_window() {
        assert_eq!(next_window(state()), 20);
    }

    #[test]
    fn high_selectivity_never_shrinks_below_initial_window() {
        let s = WindowState {
            collected: 9,
            ..state()
        };
        assert_eq!(next_window(s), 10);
    }

    #[test]
    fn growth_is_capped_by_target_multiple() {
        let s = WindowState {
            initial_window: 150,
            window: 80,
            scanned: 150,
            ..state()
        };
        assert_eq!(next_window(s), 100);
    }

    #[test]
    fn window_never_passes_the_end() {
        let s = WindowState {
            remaining_records: 7,
            ..state()
        };
        assert_eq!(next_window(s), 7);
    }

    #[test]
    fn moderate_selectivity_estimates_rows_needed() {
        // 2 of 10 matched: need 8 more at 20% -> 40 rows, capped at double (20).
        let s = WindowState {
            collected: 2,
            ..state()
        };
        assert_eq!(next_window(s), 20);
        let s = WindowState {
            collected: 5,
            scanned: 20,
            window: 40,
            ..state()
        };
        // need 5 at 25% -> 20.
        assert_eq!(next_window(s), 20);
    }
}
