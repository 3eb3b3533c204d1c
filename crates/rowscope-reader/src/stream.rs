use crate::error::{ReadError, Result};
use crate::fetch::{Window, WindowedFetcher};
use crate::filter::RowPredicate;
use crate::pager::{AdaptiveFilterPager, PagerRequest};
use crate::projection::Projection;
use crate::source::RowSource;
use rowscope_model::{Record, Row};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamState {
    /// More pages may follow.
    Active,
    /// The last page is buffered; stop once it drains.
    LastPage,
    Done,
}

/// Forward-only, page-at-a-time sequence of records.
///
/// At most one page is buffered. Dropping the stream stops all further
/// fetches. After an error is yielded the stream is finished.
pub struct RecordStream<'a, S: ?Sized> {
    fetcher: WindowedFetcher<'a, S>,
    projection: Projection,
    filter: Option<Arc<dyn RowPredicate>>,
    buffer_length: usize,
    dynamic: bool,
    position: usize,
    buffer: std::vec::IntoIter<Row>,
    pages: usize,
    state: StreamState,
}

impl<'a, S: RowSource + ?Sized> RecordStream<'a, S> {
    pub(crate) fn new(
        fetcher: WindowedFetcher<'a, S>,
        projection: Projection,
        filter: Option<Arc<dyn RowPredicate>>,
        start: usize,
        buffer_length: usize,
        dynamic: bool,
    ) -> Result<Self> {
        if buffer_length == 0 {
            return Err(ReadError::invalid_range("buffer length must be positive"));
        }
        let records = fetcher.record_count();
        if start > records {
            return Err(ReadError::invalid_range(format!(
                "start {start} is beyond the last record ({records})"
            )));
        }
        Ok(Self {
            fetcher,
            projection,
            filter,
            buffer_length,
            dynamic,
            position: start,
            buffer: Vec::new().into_iter(),
            pages: 0,
            state: StreamState::Active,
        })
    }

    /// Next unread row offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Pages requested so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    pub fn is_exhausted(&self) -> bool {
        self.state != StreamState::Active && self.buffer.len() == 0
    }

    fn load_page(&mut self) -> Result<Vec<Row>> {
        self.pages += 1;
        match &self.filter {
            None => {
                let page = self
                    .fetcher
                    .fetch(self.position, Window::Rows(self.buffer_length))?;
                self.position += page.len();
                if page.len() < self.buffer_length {
                    self.state = StreamState::LastPage;
                }
                Ok(page.rows)
            }
            Some(filter) => {
                let request = PagerRequest::new(self.position, Some(self.buffer_length))
                    .with_dynamic(self.dynamic);
                let page = AdaptiveFilterPager::new(&self.fetcher).run(filter.as_ref(), request)?;
                self.position = page.resume_at;
                if page.exhausted {
                    self.state = StreamState::LastPage;
                }
                Ok(page.rows)
            }
        }
    }
}

impl<S: RowSource + ?Sized> Iterator for RecordStream<'_, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.buffer.next() {
                return Some(Ok(self.projection.apply(row)));
            }
            if self.state != StreamState::Active
                || self.position >= self.fetcher.record_count()
            {
                self.state = StreamState::Done;
                return None;
            }
            match self.load_page() {
                Ok(rows) if rows.is_empty() => {
                    self.state = StreamState::Done;
                    return None;
                }
                Ok(rows) => self.buffer = rows.into_iter(),
                Err(err) => {
                    self.state = StreamState::Done;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<S: RowSource + ?Sized> std::iter::FusedIterator for RecordStream<'_, S> {}
