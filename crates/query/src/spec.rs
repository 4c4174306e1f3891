//! The per-execution query description consumed by the batch iterator.

use crate::{
    ast::select::Select,
    dialect::Dialect,
    error::QueryError,
    exec::{QueryExecutor, RowSource},
    renderer::{Render, Renderer},
    transform::{RowTransform, TransformPipeline},
};
use model::{core::value::Value, records::row::RowData};
use std::sync::Arc;
use tracing::debug;

/// A declarative query plus its post-processing hooks.
///
/// A `QuerySpec` is never mutated by iteration; bounded variants are
/// produced with [`QuerySpec::with_bounds`].
#[derive(Clone)]
pub struct QuerySpec {
    select: Select,
    index_by: Option<String>,
    pipeline: TransformPipeline,
}

impl QuerySpec {
    pub fn new(select: Select) -> Self {
        QuerySpec {
            select,
            index_by: None,
            pipeline: TransformPipeline::new(),
        }
    }

    /// Derives row-mode keys from this field instead of a running counter.
    pub fn index_by(mut self, field: &str) -> Self {
        self.index_by = Some(field.to_string());
        self
    }

    /// Appends a post-processing step applied to every fetched window.
    pub fn transform(mut self, step: Arc<dyn RowTransform>) -> Self {
        self.pipeline.add_step(step);
        self
    }

    /// The caller-declared cap on total rows, if any.
    pub fn limit(&self) -> Option<usize> {
        self.select.limit
    }

    pub fn index_field(&self) -> Option<&str> {
        self.index_by.as_deref()
    }

    pub fn select(&self) -> &Select {
        &self.select
    }

    /// Returns a copy of this spec bounded to one fetch window.
    /// The original spec is left untouched.
    pub fn with_bounds(&self, limit: usize, offset: usize) -> QuerySpec {
        let mut bounded = self.clone();
        bounded.select.limit = Some(limit);
        bounded.select.offset = Some(offset);
        bounded
    }

    /// Runs the transform pipeline over one fetched window.
    pub fn populate(&self, rows: Vec<RowData>) -> Vec<RowData> {
        self.pipeline.apply_all(rows)
    }

    /// Renders the query to SQL for the given dialect.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> (String, Vec<Value>) {
        let mut renderer = Renderer::new(dialect);
        self.select.render(&mut renderer);
        renderer.finish()
    }

    /// Executes the query and materializes all of its rows, post-processed.
    pub async fn execute_all(
        &self,
        conn: &dyn QueryExecutor,
    ) -> Result<Vec<RowData>, QueryError> {
        let rows = conn.fetch_all(&self.select).await?;
        debug!(
            rows = rows.len(),
            limit = ?self.select.limit,
            offset = ?self.select.offset,
            "Materialized query window."
        );
        Ok(self.populate(rows))
    }

    /// Opens a server-side cursor over the query's full result set.
    pub async fn open_stream(
        &self,
        conn: &dyn QueryExecutor,
    ) -> Result<Box<dyn RowSource>, QueryError> {
        conn.open_stream(&self.select).await
    }
}
