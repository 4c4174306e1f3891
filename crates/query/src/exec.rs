//! The connection-side contract consumed by the batch iterator.
//!
//! Executors receive the `Select` AST rather than SQL text; a database-backed
//! implementation renders it through [`crate::renderer`] for its dialect,
//! while test doubles may interpret the AST directly.

use crate::{ast::select::Select, error::QueryError};
use async_trait::async_trait;
use model::records::row::RowData;

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes the query and materializes every row it returns.
    async fn fetch_all(&self, query: &Select) -> Result<Vec<RowData>, QueryError>;

    /// Executes the query and returns an open, incrementally readable
    /// result stream backed by a server-side cursor.
    async fn open_stream(&self, query: &Select) -> Result<Box<dyn RowSource>, QueryError>;
}

/// An open server-side result stream.
///
/// Owned by exactly one consumer; `close` must be idempotent and must never
/// fail so that release can run unconditionally from destructors.
#[async_trait]
pub trait RowSource: Send {
    /// Reads the next row, or `None` once the stream is exhausted.
    async fn read_one(&mut self) -> Result<Option<RowData>, QueryError>;

    /// Releases the server-side cursor. Safe to call more than once.
    fn close(&mut self);
}
