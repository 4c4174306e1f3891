use async_trait::async_trait;
use batch::{BatchIterator, BatchKey, QueryBatchExt};
use model::{core::value::Value, records::row::RowData};
use query::{
    ast::{expr::ident, select::Select, select::SelectBuilder},
    error::QueryError,
    exec::{QueryExecutor, RowSource},
    spec::QuerySpec,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// In-memory table that interprets the Select AST's limit/offset directly,
/// recording every window it executes.
struct MockDb {
    rows: Vec<RowData>,
    windows: Mutex<Vec<(usize, usize)>>,
    fail_on_fetch: Mutex<Option<usize>>,
    closes: Arc<AtomicUsize>,
}

impl MockDb {
    fn with_rows(count: usize) -> Self {
        let rows = (1..=count)
            .map(|id| {
                RowData::from_pairs(
                    "users",
                    vec![
                        ("id", Value::Int(id as i64)),
                        ("name", Value::String(format!("user-{id}"))),
                    ],
                )
            })
            .collect();
        MockDb {
            rows,
            windows: Mutex::new(Vec::new()),
            fail_on_fetch: Mutex::new(None),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fails the n-th call to `fetch_all` (0-based), once.
    fn fail_on_fetch(self, n: usize) -> Self {
        *self.fail_on_fetch.lock().unwrap() = Some(n);
        self
    }

    fn executed_windows(&self) -> Vec<(usize, usize)> {
        self.windows.lock().unwrap().clone()
    }

    fn slice(&self, query: &Select) -> Vec<RowData> {
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(self.rows.len());
        self.rows.iter().skip(offset).take(limit).cloned().collect()
    }
}

#[async_trait]
impl QueryExecutor for MockDb {
    async fn fetch_all(&self, query: &Select) -> Result<Vec<RowData>, QueryError> {
        let call = {
            let mut windows = self.windows.lock().unwrap();
            windows.push((query.limit.unwrap_or(0), query.offset.unwrap_or(0)));
            windows.len() - 1
        };

        let mut fail_on = self.fail_on_fetch.lock().unwrap();
        if *fail_on == Some(call) {
            *fail_on = None;
            return Err(QueryError::Execution("injected failure".into()));
        }

        Ok(self.slice(query))
    }

    async fn open_stream(&self, query: &Select) -> Result<Box<dyn RowSource>, QueryError> {
        Ok(Box::new(MockStream {
            rows: self.slice(query),
            pos: 0,
            closes: self.closes.clone(),
        }))
    }
}

struct MockStream {
    rows: Vec<RowData>,
    pos: usize,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl RowSource for MockStream {
    async fn read_one(&mut self) -> Result<Option<RowData>, QueryError> {
        let row = self.rows.get(self.pos).cloned();
        if row.is_some() {
            self.pos += 1;
        }
        Ok(row)
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

fn users_spec(limit: Option<usize>) -> QuerySpec {
    let mut builder = SelectBuilder::new()
        .select(vec![ident("id"), ident("name")])
        .from("users", None);
    if let Some(limit) = limit {
        builder = builder.limit(limit);
    }
    QuerySpec::new(builder.build())
}

fn id_of(row: &RowData) -> i64 {
    match row.get_value("id") {
        Value::Int(id) => id,
        other => panic!("unexpected id value: {other:?}"),
    }
}

async fn drain_rows(it: &mut BatchIterator) -> Vec<i64> {
    let mut ids = Vec::new();
    it.rewind().await.unwrap();
    while it.valid() {
        ids.push(id_of(it.current_row().unwrap()));
        it.advance().await.unwrap();
    }
    ids
}

async fn drain_batches(it: &mut BatchIterator) -> Vec<Vec<i64>> {
    let mut batches = Vec::new();
    it.rewind().await.unwrap();
    while it.valid() {
        batches.push(it.current_batch().unwrap().iter().map(id_of).collect());
        it.advance().await.unwrap();
    }
    batches
}

#[tokio::test]
async fn paged_windows_with_declared_limit() {
    let db = Arc::new(MockDb::with_rows(25));
    let mut it = users_spec(Some(22)).batch(10, db.clone()).paged(true);

    let batches = drain_batches(&mut it).await;
    let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();

    // The window shrinks to the cap, then one boundary row is requested at
    // the cap's offset before the zero window ends the iteration.
    assert_eq!(sizes, vec![10, 10, 2, 1]);
    assert_eq!(
        db.executed_windows(),
        vec![(10, 0), (10, 10), (2, 20), (1, 22)]
    );

    let ids: Vec<i64> = batches.into_iter().flatten().collect();
    assert_eq!(ids, (1..=23).collect::<Vec<i64>>());
}

#[tokio::test]
async fn paged_cap_beyond_data_yields_everything_once() {
    let db = Arc::new(MockDb::with_rows(25));
    let mut it = users_spec(Some(30)).each(10, db.clone()).paged(true);

    let ids = drain_rows(&mut it).await;
    assert_eq!(ids, (1..=25).collect::<Vec<i64>>());
    // The third window comes back short; the boundary window at the cap
    // finds nothing and terminates the iteration.
    assert_eq!(
        db.executed_windows(),
        vec![(10, 0), (10, 10), (10, 20), (1, 30)]
    );
}

#[tokio::test]
async fn paged_unbounded_stops_on_empty_window() {
    let db = Arc::new(MockDb::with_rows(25));
    let mut it = users_spec(None).batch(10, db.clone()).paged(true);

    let batches = drain_batches(&mut it).await;
    let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![10, 10, 5]);
    assert_eq!(
        db.executed_windows(),
        vec![(10, 0), (10, 10), (10, 20), (10, 30)]
    );
}

#[tokio::test]
async fn zero_limit_never_executes_a_fetch() {
    let db = Arc::new(MockDb::with_rows(25));
    let mut it = users_spec(Some(0)).batch(10, db.clone()).paged(true);

    it.rewind().await.unwrap();
    assert!(!it.valid());
    assert!(it.key().is_none());
    assert!(it.current().is_none());
    assert!(db.executed_windows().is_empty());
}

#[tokio::test]
async fn row_keys_are_continuous_across_batches() {
    let db = Arc::new(MockDb::with_rows(25));
    let mut it = users_spec(None).each(10, db.clone());

    let mut keys = Vec::new();
    it.rewind().await.unwrap();
    while it.valid() {
        match it.key().unwrap() {
            BatchKey::Index(i) => keys.push(*i),
            other => panic!("unexpected key: {other:?}"),
        }
        it.advance().await.unwrap();
    }

    assert_eq!(keys, (0..25).collect::<Vec<usize>>());
    assert!(!it.valid());
}

#[tokio::test]
async fn cursor_and_paged_row_sequences_match() {
    let db = Arc::new(MockDb::with_rows(23));

    let mut streamed = users_spec(None).each(10, db.clone());
    let mut paged = users_spec(None).each(10, db.clone()).paged(true);

    assert_eq!(drain_rows(&mut streamed).await, drain_rows(&mut paged).await);
}

#[tokio::test]
async fn batch_mode_rows_flatten_to_row_mode_sequence() {
    let db = Arc::new(MockDb::with_rows(25));

    let mut by_batch = users_spec(None).batch(10, db.clone()).paged(true);
    let mut by_row = users_spec(None).each(10, db.clone()).paged(true);

    let flattened: Vec<i64> = drain_batches(&mut by_batch)
        .await
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(flattened, drain_rows(&mut by_row).await);
}

#[tokio::test]
async fn index_by_uses_field_values_as_keys() {
    let db = Arc::new(MockDb::with_rows(3));
    let spec = users_spec(None).index_by("name");
    let mut it = spec.each(2, db.clone());

    let mut keys = Vec::new();
    it.rewind().await.unwrap();
    while it.valid() {
        match it.key().unwrap() {
            BatchKey::Field(value) => keys.push(value.clone()),
            other => panic!("unexpected key: {other:?}"),
        }
        it.advance().await.unwrap();
    }

    assert_eq!(
        keys,
        vec![
            Value::String("user-1".into()),
            Value::String("user-2".into()),
            Value::String("user-3".into()),
        ]
    );
}

#[tokio::test]
async fn batch_mode_keys_count_batches() {
    let db = Arc::new(MockDb::with_rows(25));
    let mut it = users_spec(None).batch(10, db.clone());

    let mut keys = Vec::new();
    it.rewind().await.unwrap();
    while it.valid() {
        match it.key().unwrap() {
            BatchKey::Index(i) => keys.push(*i),
            other => panic!("unexpected key: {other:?}"),
        }
        it.advance().await.unwrap();
    }

    assert_eq!(keys, vec![0, 1, 2]);
}

#[tokio::test]
async fn reset_is_idempotent_and_iteration_restarts() {
    let db = Arc::new(MockDb::with_rows(15));
    let mut it = users_spec(None).each(10, db.clone()).paged(true);

    // Safe on a never-started iterator, repeatedly.
    it.reset();
    it.reset();
    assert!(!it.valid());
    assert!(it.key().is_none());
    assert!(it.current_row().is_none());

    let first = drain_rows(&mut it).await;
    let second = drain_rows(&mut it).await;
    assert_eq!(first, (1..=15).collect::<Vec<i64>>());
    assert_eq!(first, second);
}

#[tokio::test]
async fn early_break_closes_the_cursor_exactly_once() {
    let db = Arc::new(MockDb::with_rows(25));
    let closes = db.closes.clone();

    {
        let mut it = users_spec(None).each(10, db.clone());
        it.rewind().await.unwrap();
        assert!(it.valid());
        // Walk a few rows, then abandon the iteration mid-batch.
        it.advance().await.unwrap();
        it.advance().await.unwrap();
    }

    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn explicit_reset_then_drop_releases_once() {
    let db = Arc::new(MockDb::with_rows(5));
    let closes = db.closes.clone();

    {
        let mut it = users_spec(None).batch(2, db.clone());
        it.rewind().await.unwrap();
        it.reset();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    // Drop after reset must not release again.
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_failure_propagates_and_reset_recovers() {
    let db = Arc::new(MockDb::with_rows(25).fail_on_fetch(1));
    let mut it = users_spec(None).each(10, db.clone()).paged(true);

    it.rewind().await.unwrap();
    for _ in 0..9 {
        it.advance().await.unwrap();
    }
    // Stepping off the first batch triggers the failing fetch.
    let err = it.advance().await.unwrap_err();
    assert!(err.to_string().contains("injected failure"));

    // The iterator is still resettable and replays from the start.
    it.reset();
    let ids = drain_rows(&mut it).await;
    assert_eq!(ids, (1..=25).collect::<Vec<i64>>());
}

#[tokio::test]
async fn cursor_mode_respects_server_side_limit() {
    let db = Arc::new(MockDb::with_rows(25));
    let mut it = users_spec(Some(7)).each(10, db.clone());

    let ids = drain_rows(&mut it).await;
    assert_eq!(ids, (1..=7).collect::<Vec<i64>>());
    // A single open stream served the whole iteration.
    assert!(db.executed_windows().is_empty());
}

#[tokio::test]
async fn accessors_before_rewind_are_defined() {
    let db = Arc::new(MockDb::with_rows(5));
    let it = users_spec(None).each(2, db.clone());

    assert!(!it.valid());
    assert!(it.key().is_none());
    assert!(it.current().is_none());
    assert!(it.current_row().is_none());
    assert!(it.current_batch().is_none());
}
