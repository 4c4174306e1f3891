use query::error::QueryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    /// The fetch for the next window failed; the iterator keeps its previous
    /// state and stays safe to reset.
    #[error("Batch fetch failed: {0}")]
    Fetch(#[from] QueryError),
}
