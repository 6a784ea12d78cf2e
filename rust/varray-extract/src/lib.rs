//! Selection-aware ragged-array iteration and decode engine.
//!
//! This crate walks a columnar variant/sample array store one selected
//! variant at a time and streams assembled records to a caller-supplied
//! callback. It understands five field families: fixed-size scalars per
//! variant, dense phase arrays, bit-packed multi-ploidy genotypes, and
//! ragged INFO/FORMAT fields whose per-variant element counts live in an
//! auxiliary run-length index array.
//!
//! # Main components
//!
//! - [`ragged::map_run_length_index`] turns a run-length index plus a
//!   variant selection into an element-level mapping: offsets, per-variant
//!   lengths and a flattened inclusion bitmap over the touched range.
//! - [`cursor::FieldCursor`] steps a single field through the selected
//!   variant subset, tracking how many storage cells each variant occupies.
//! - [`genotype::GenotypeDecoder`] reassembles packed per-sample call codes
//!   from one or more ploidy slides into dense integers, resolving the
//!   missing-call sentinel.
//! - [`driver::apply`] advances a set of cursors in lockstep, invoking the
//!   callback once per selected variant and coercing its results into the
//!   configured output container.
//! - [`column::read_field`] performs a one-shot whole-column read of a
//!   single field under the current selection.
//!
//! The engine is single-threaded and synchronous; one `apply` call owns its
//! scratch and cache state exclusively.

pub mod column;
pub mod cursor;
pub mod driver;
pub mod field;
pub mod genotype;
pub mod ragged;
pub mod selection;
pub mod shape;


pub use column::{Column, read_field};
pub use cursor::FieldCursor;
pub use driver::{
    ApplyOptions, ExtractOutput, IndexMode, Record, RecordField, ResultMode, Step, StepValue,
    apply,
};
pub use field::{FieldShapeClass, classify_field};
pub use genotype::{GenotypeDecoder, GenotypeScratch};
pub use ragged::{RaggedMapping, map_run_length_index};
pub use selection::{CompiledSelection, Selection, SelectionMask};
pub use shape::BufferShape;

/// Marker substituted for integer values that carry no observation, both in
/// genotype decode (all ploidy layers reported "no call") and in scalar
/// result coercion of an empty callback return.
pub const MISSING_INT: i32 = i32::MIN;
