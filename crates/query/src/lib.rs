pub mod ast;
pub mod dialect;
pub mod error;
pub mod exec;
pub mod renderer;
pub mod spec;
pub mod transform;
