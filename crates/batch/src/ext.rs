//! Factory methods hanging batched iteration off a [`QuerySpec`].

use crate::iter::BatchIterator;
use query::{exec::QueryExecutor, spec::QuerySpec};
use std::sync::Arc;

pub trait QueryBatchExt {
    /// Iterates the query's results `batch_size` rows at a time.
    fn batch(&self, batch_size: usize, conn: Arc<dyn QueryExecutor>) -> BatchIterator;

    /// Iterates the query's results one row at a time, fetched internally
    /// in batches of `batch_size`.
    fn each(&self, batch_size: usize, conn: Arc<dyn QueryExecutor>) -> BatchIterator;
}

impl QueryBatchExt for QuerySpec {
    fn batch(&self, batch_size: usize, conn: Arc<dyn QueryExecutor>) -> BatchIterator {
        BatchIterator::new(self.clone(), conn).batch_size(batch_size)
    }

    fn each(&self, batch_size: usize, conn: Arc<dyn QueryExecutor>) -> BatchIterator {
        BatchIterator::new(self.clone(), conn)
            .batch_size(batch_size)
            .each(true)
    }
}
