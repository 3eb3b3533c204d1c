mod common;

use common::{ages_table, class_table, path, AGES_PATH, CLASS_PATH};
use rowscope_reader::source::MemorySource;
use rowscope_reader::{
    ErrorKind, FetchCounters, FetchStats, ReadError, RowSource, SchemaCache, SourceError, Window,
    WindowedFetcher,
};

#[test]
fn invalid_ranges_never_reach_the_source() {
    let source = MemorySource::new().with_table(CLASS_PATH, class_table());
    let meta = SchemaCache::new().load(&source, path(CLASS_PATH)).unwrap();
    let stats = FetchStats::default();
    let fetcher = WindowedFetcher::new(&source, path(CLASS_PATH), &meta, &stats);

    let err = fetcher.fetch(0, Window::Rows(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRange);
    let err = fetcher.fetch(20, Window::Rows(5)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRange);
    let err = fetcher.fetch(20, Window::All).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRange);

    assert_eq!(source.fetch_count(), 0);
    assert_eq!(stats.snapshot().calls, 0);
}

#[test]
fn start_at_record_count_is_empty_without_io() {
    let source = MemorySource::new().with_table(CLASS_PATH, class_table());
    let meta = SchemaCache::new().load(&source, path(CLASS_PATH)).unwrap();
    let stats = FetchStats::default();
    let fetcher = WindowedFetcher::new(&source, path(CLASS_PATH), &meta, &stats);

    let page = fetcher.fetch(19, Window::All).unwrap();
    assert!(page.is_empty());
    assert_eq!(page.start, 19);
    assert_eq!(source.fetch_count(), 0);
}

#[test]
fn pages_pass_through_source_rows() {
    let table = ages_table(40);
    let expected = table.rows[5..15].to_vec();
    let source = MemorySource::new().with_table(AGES_PATH, table);
    let meta = SchemaCache::new().load(&source, path(AGES_PATH)).unwrap();
    let stats = FetchStats::default();
    let fetcher = WindowedFetcher::new(&source, path(AGES_PATH), &meta, &stats);

    let page = fetcher.fetch(5, Window::Rows(10)).unwrap();
    assert_eq!(page.rows, expected);

    let rest = fetcher.fetch(35, Window::All).unwrap();
    assert_eq!(rest.len(), 5);
    assert_eq!((rest.start, rest.requested), (35, Window::All));
    let tail = fetcher.fetch(38, Window::Rows(10)).unwrap();
    assert_eq!(tail.len(), 2);

    assert_eq!(source.requests(), vec![(5, 10), (35, -1), (38, 10)]);
    let counters = stats.snapshot();
    assert_eq!(counters.calls, 3);
    assert_eq!(counters.rows, 17);
}

#[test]
fn source_failures_are_wrapped_not_retried() {
    let source = MemorySource::new().with_table(AGES_PATH, ages_table(40).with_corrupt_from(30));
    let meta = SchemaCache::new().load(&source, path(AGES_PATH)).unwrap();
    let stats = FetchStats::default();
    let fetcher = WindowedFetcher::new(&source, path(AGES_PATH), &meta, &stats);

    assert_eq!(fetcher.fetch(0, Window::Rows(30)).unwrap().len(), 30);
    let err = fetcher.fetch(25, Window::Rows(10)).unwrap_err();
    match &err {
        ReadError::FetchFailed {
            start,
            window,
            source,
        } => {
            assert_eq!(*start, 25);
            assert_eq!(*window, Window::Rows(10));
            assert!(matches!(source, SourceError::Corrupt { row: 30, .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.kind(), ErrorKind::FetchFailed);
    assert_eq!(source.fetch_count(), 2);
    // The failed call still reached the source.
    assert_eq!(stats.snapshot(), FetchCounters { calls: 2, rows: 30 });
}

#[test]
fn memory_source_validates_like_the_native_reader() {
    let source = MemorySource::new().with_table(CLASS_PATH, class_table());
    let err = source.fetch_rows(path(CLASS_PATH), -5, 1).unwrap_err();
    assert_eq!(err.to_string(), "Row offset must be non-negative");
    let err = source.fetch_rows(path(CLASS_PATH), 0, -5).unwrap_err();
    assert!(err.to_string().starts_with("Row limit must be positive or -1"));
    let err = source.fetch_rows(path(CLASS_PATH), 0, 0).unwrap_err();
    assert!(matches!(err, SourceError::InvalidLimit));
}
