use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    /// The underlying query failed to execute (syntax, constraint, etc.).
    #[error("Query execution failed: {0}")]
    Execution(String),

    /// The connection to the database was lost or refused.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A fetched row could not be decoded into the row model.
    #[error("Row decode error: {0}")]
    Decode(String),
}
