//! Storage-engine boundary for the varray extraction engine.
//!
//! The extraction core consumes disk-resident arrays through the narrow
//! [`store::ArrayStore`] / [`store::ArrayNode`] traits: node lookup by path,
//! dimension and element-type introspection, flat run-length reads, and dense
//! multi-dimensional reads with independent per-axis boolean selection.
//!
//! [`memory::MemoryStore`] is the in-memory reference implementation backing
//! the test suites and demos; an on-disk container format is out of scope for
//! this crate.

pub mod buffer;
pub mod memory;
pub mod store;

pub use buffer::ValueBuffer;
pub use store::{ArrayNode, ArrayStore, AxisSelection, ElementType};
