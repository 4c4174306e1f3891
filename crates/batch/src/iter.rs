//! The restartable, forward-only iterator over batched query results.

use crate::{
    error::BatchError,
    strategy::{FetchStrategy, PagedFetch, StreamFetch},
};
use model::{core::value::Value, records::row::RowData};
use query::{exec::QueryExecutor, spec::QuerySpec};
use std::sync::Arc;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// The key exposed for the current iteration step.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchKey {
    /// Running counter: batch number in batch mode, row number in row mode.
    /// Continuous across batch boundaries, starting at 0.
    Index(usize),

    /// The `index_by` field's value on the current row. Uniqueness and
    /// ordering are the caller's responsibility.
    Field(Value),
}

/// The value exposed for the current iteration step.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchValue<'a> {
    Row(&'a RowData),
    Rows(&'a [RowData]),
}

/// Iterates a query's results in batches of `batch_size` rows, exposing
/// either whole batches or one row at a time.
///
/// Driving the iteration:
///
/// ```ignore
/// let mut it = spec.each(100, conn).paged(true);
/// it.rewind().await?;
/// while it.valid() {
///     let row = it.current_row();
///     // ...
///     it.advance().await?;
/// }
/// ```
///
/// Any open server-side cursor is released on `reset()` and on drop, no
/// matter how the iteration ended.
pub struct BatchIterator {
    query: QuerySpec,
    conn: Arc<dyn QueryExecutor>,
    batch_size: usize,
    each: bool,
    strategy: Box<dyn FetchStrategy>,

    /// Rows from the most recent fetch; `None` before the first fetch.
    batch: Option<Vec<RowData>>,

    /// Explicit in-batch position for row mode.
    pos: usize,

    key: Option<BatchKey>,

    /// Last counter key handed out, across all batches of this iteration.
    last_index: Option<usize>,
}

impl BatchIterator {
    /// Creates an iterator in batch mode with the cursor fetch strategy and
    /// the default batch size of 100.
    pub fn new(query: QuerySpec, conn: Arc<dyn QueryExecutor>) -> Self {
        BatchIterator {
            query,
            conn,
            batch_size: DEFAULT_BATCH_SIZE,
            each: false,
            strategy: Box::new(StreamFetch::new()),
            batch: None,
            pos: 0,
            key: None,
            last_index: None,
        }
    }

    /// Rows requested per fetch.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Row-by-row exposure instead of whole batches.
    pub fn each(mut self, each: bool) -> Self {
        self.each = each;
        self
    }

    /// Switches between LIMIT/OFFSET paging and the single-cursor strategy.
    pub fn paged(mut self, paged: bool) -> Self {
        self.strategy = if paged {
            Box::new(PagedFetch::new())
        } else {
            Box::new(StreamFetch::new())
        };
        self
    }

    /// Returns the iterator to its pre-iteration state, releasing any open
    /// row source. Idempotent.
    pub fn reset(&mut self) {
        self.strategy.reset();
        self.batch = None;
        self.pos = 0;
        self.key = None;
        self.last_index = None;
    }

    /// Resets and establishes the first element.
    pub async fn rewind(&mut self) -> Result<(), BatchError> {
        self.reset();
        self.advance().await
    }

    /// Moves to the next element, fetching a new batch when the current one
    /// is exhausted (or on every step in batch mode).
    pub async fn advance(&mut self) -> Result<(), BatchError> {
        let need_fetch = match &self.batch {
            None => true,
            Some(batch) => {
                if !self.each {
                    true
                } else {
                    self.pos += 1;
                    self.pos >= batch.len()
                }
            }
        };

        if need_fetch {
            let rows = self
                .strategy
                .fetch_batch(&self.query, self.conn.as_ref(), self.batch_size)
                .await?;
            self.batch = Some(rows);
            self.pos = 0;
        }

        if self.each {
            let indexed = self
                .query
                .index_field()
                .map(|field| self.current_row().map(|row| row.get_value(field)));
            self.key = match indexed {
                // index_by configured: the field's value, if a row exists
                Some(value) => value.map(BatchKey::Field),
                // counter key, continuous across batches
                None if self.current_row().is_some() => {
                    Some(BatchKey::Index(self.next_index()))
                }
                None => None,
            };
        } else {
            let next = self.next_index();
            self.key = Some(BatchKey::Index(next));
        }

        Ok(())
    }

    /// True while the last fetch produced at least one row.
    pub fn valid(&self) -> bool {
        self.batch.as_ref().is_some_and(|batch| !batch.is_empty())
    }

    /// The key of the current step; `None` before the first `advance()` or
    /// once the iteration is exhausted.
    pub fn key(&self) -> Option<&BatchKey> {
        if self.valid() {
            self.key.as_ref()
        } else {
            None
        }
    }

    /// The current row (row mode) or batch (batch mode).
    pub fn current(&self) -> Option<BatchValue<'_>> {
        if self.each {
            self.current_row().map(BatchValue::Row)
        } else {
            self.current_batch().map(BatchValue::Rows)
        }
    }

    pub fn current_row(&self) -> Option<&RowData> {
        self.batch.as_ref()?.get(self.pos)
    }

    pub fn current_batch(&self) -> Option<&[RowData]> {
        match &self.batch {
            Some(batch) if !batch.is_empty() => Some(batch.as_slice()),
            _ => None,
        }
    }

    fn next_index(&mut self) -> usize {
        let next = self.last_index.map_or(0, |last| last + 1);
        self.last_index = Some(next);
        next
    }
}

impl Drop for BatchIterator {
    fn drop(&mut self) {
        self.reset();
    }
}
