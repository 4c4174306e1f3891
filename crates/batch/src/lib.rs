//! Streams the results of a relational query in bounded-size batches.
//!
//! A [`BatchIterator`] wraps a [`query::spec::QuerySpec`] and yields either
//! whole batches of rows or one row at a time, fetching from the database
//! either through one open server-side cursor or through repeated
//! LIMIT/OFFSET windows.

pub mod error;
pub mod ext;
pub mod iter;

mod strategy;
mod window;

pub use error::BatchError;
pub use ext::QueryBatchExt;
pub use iter::{BatchIterator, BatchKey, BatchValue};
