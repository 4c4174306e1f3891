//! The two fetch strategies behind one trait object, chosen when the
//! iterator is constructed.

use crate::{error::BatchError, window::window_size};
use async_trait::async_trait;
use model::records::row::RowData;
use query::{
    exec::{QueryExecutor, RowSource},
    spec::QuerySpec,
};
use tracing::debug;

#[async_trait]
pub(crate) trait FetchStrategy: Send {
    /// Fetches the next window of post-processed rows. An empty result
    /// means the iteration is exhausted.
    async fn fetch_batch(
        &mut self,
        query: &QuerySpec,
        conn: &dyn QueryExecutor,
        batch_size: usize,
    ) -> Result<Vec<RowData>, BatchError>;

    /// Returns the strategy to its pre-iteration state, releasing any open
    /// resources. Idempotent and infallible.
    fn reset(&mut self);
}

/// Re-executes the query per window with an explicit LIMIT/OFFSET pair.
///
/// Used where a driver's buffered result sets accumulate process memory
/// even when consumed incrementally.
pub(crate) struct PagedFetch {
    /// Sum of all windows requested so far.
    offset: usize,

    /// The query's own limit, captured on the first fetch and held for the
    /// life of the iteration. Outer `None` = not captured yet.
    declared_limit: Option<Option<usize>>,
}

impl PagedFetch {
    pub(crate) fn new() -> Self {
        PagedFetch {
            offset: 0,
            declared_limit: None,
        }
    }
}

#[async_trait]
impl FetchStrategy for PagedFetch {
    async fn fetch_batch(
        &mut self,
        query: &QuerySpec,
        conn: &dyn QueryExecutor,
        batch_size: usize,
    ) -> Result<Vec<RowData>, BatchError> {
        let declared = *self.declared_limit.get_or_insert_with(|| query.limit());
        let window = window_size(batch_size, self.offset, declared);

        debug!(
            window,
            offset = self.offset,
            declared_limit = ?declared,
            "Computed paged fetch window."
        );

        let rows = if window == 0 {
            Vec::new()
        } else {
            let bounded = query.with_bounds(window, self.offset);
            bounded.execute_all(conn).await?
        };

        // Advance by the window requested, not the rows returned, so a
        // short final page still terminates on the next call.
        self.offset += window;

        Ok(rows)
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.declared_limit = None;
    }
}

/// Reads rows off one open server-side cursor until it is exhausted.
pub(crate) struct StreamFetch {
    source: Option<Box<dyn RowSource>>,
}

impl StreamFetch {
    pub(crate) fn new() -> Self {
        StreamFetch { source: None }
    }
}

#[async_trait]
impl FetchStrategy for StreamFetch {
    async fn fetch_batch(
        &mut self,
        query: &QuerySpec,
        conn: &dyn QueryExecutor,
        batch_size: usize,
    ) -> Result<Vec<RowData>, BatchError> {
        if self.source.is_none() {
            self.source = Some(query.open_stream(conn).await?);
        }

        let mut rows = Vec::with_capacity(batch_size);
        if let Some(source) = self.source.as_mut() {
            while rows.len() < batch_size {
                match source.read_one().await? {
                    Some(row) => rows.push(row),
                    None => break,
                }
            }
        }

        debug!(rows = rows.len(), "Read streamed batch.");

        Ok(query.populate(rows))
    }

    fn reset(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
        }
    }
}

impl Drop for StreamFetch {
    fn drop(&mut self) {
        self.reset();
    }
}
