//! The array store traits consumed by the extraction core.

use std::sync::Arc;

use varray_common::{Result, error::Error};

use crate::buffer::ValueBuffer;

/// The element type of a stored array, as surfaced to the extraction core.
///
/// Narrow on-disk encodings (e.g. byte-packed genotype codes) are widened to
/// these three families at the read boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Integer,
    Float,
    String,
}

/// Per-axis selection applied by [`ArrayNode::read_selected`].
///
/// A `Mask` must have exactly as many flags as the read window spans along
/// that axis; flags are relative to the window, not to the full axis.
#[derive(Debug, Clone, Copy)]
pub enum AxisSelection<'a> {
    /// Every position along the axis window is read.
    All,
    /// Only positions flagged `true` are emitted.
    Mask(&'a [bool]),
}

impl AxisSelection<'_> {
    #[inline]
    pub fn is_selected(&self, index: usize) -> bool {
        match self {
            AxisSelection::All => true,
            AxisSelection::Mask(flags) => flags[index],
        }
    }
}

/// A single stored array, addressable by flat element offset or by a
/// multi-dimensional window with per-axis selection.
pub trait ArrayNode: Send + Sync {
    /// The store path this node was resolved from, used in error messages.
    fn path(&self) -> &str;

    /// The sizes of the array's dimensions, outermost first (row-major).
    fn dimensions(&self) -> &[usize];

    /// The element type family of the stored values.
    fn element_type(&self) -> ElementType;

    /// The total number of elements (the product of all dimensions).
    fn total_count(&self) -> u64;

    /// Reads `out.len()` consecutive elements starting at flat element offset
    /// `start` into `out`, widening narrow integer encodings to `i32`.
    ///
    /// Fails with a `Dimension` error if the node is not integer-typed or the
    /// range falls outside the array.
    fn read_i32(&self, start: u64, out: &mut [i32]) -> Result<()>;

    /// Reads the window `start[d] .. start[d] + count[d]` along every axis
    /// `d`, emitting only the positions admitted by `selection[d]`, in
    /// row-major order, into `out`.
    ///
    /// `out` is cleared and refilled; its backing allocation is reused when
    /// the element type is unchanged. All three slices must have one entry
    /// per array dimension, and each `Mask` must be `count[d]` flags long.
    fn read_selected(
        &self,
        start: &[u64],
        count: &[usize],
        selection: &[AxisSelection<'_>],
        out: &mut ValueBuffer,
    ) -> Result<()>;
}

/// A collection of arrays resolvable by slash-separated path.
pub trait ArrayStore {
    /// Resolves a path to a node, or `None` if no such node exists.
    fn try_resolve(&self, path: &str) -> Result<Option<Arc<dyn ArrayNode>>>;

    /// Resolves a path to a node, failing with `NotFound` if it is absent.
    fn resolve(&self, path: &str) -> Result<Arc<dyn ArrayNode>> {
        self.try_resolve(path)?
            .ok_or_else(|| Error::not_found(path))
    }
}
