//! Output buffer shapes, memoized per run-length.

use ahash::AHashMap;
use varray_store::ValueBuffer;

/// The shape of one output buffer: its element count and, for
/// multi-dimensional layouts, axis sizes with their labels.
///
/// Axis sizes follow the store's column-major presentation convention, so
/// `dims[0]` is the fastest-varying axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferShape {
    pub element_count: usize,
    pub dims: Vec<usize>,
    pub axis_labels: Vec<&'static str>,
}

impl BufferShape {
    /// A flat shape without axis structure.
    pub fn flat(element_count: usize) -> BufferShape {
        BufferShape {
            element_count,
            dims: Vec::new(),
            axis_labels: Vec::new(),
        }
    }

    /// A labeled multi-dimensional shape.
    pub fn labeled(dims: Vec<usize>, axis_labels: Vec<&'static str>) -> BufferShape {
        BufferShape {
            element_count: dims.iter().product(),
            dims,
            axis_labels,
        }
    }
}

/// A cached output shape together with its reusable backing buffer.
#[derive(Debug)]
pub struct ShapeEntry {
    pub shape: BufferShape,
    pub buffer: ValueBuffer,
}

/// Memoizes output shapes keyed by run-length.
///
/// A shape is computed once per distinct run-length observed during a
/// session; variants sharing a run-length reuse the descriptor and its
/// backing buffer, so a cohort with constant ploidy never reallocates. The
/// cache is owned by one cursor and dropped with it when the session ends.
#[derive(Debug, Default)]
pub struct BufferShapeCache {
    entries: AHashMap<i32, ShapeEntry>,
}

impl BufferShapeCache {
    pub fn new() -> BufferShapeCache {
        BufferShapeCache::default()
    }

    #[inline]
    pub fn contains(&self, run_length: i32) -> bool {
        self.entries.contains_key(&run_length)
    }

    pub fn insert(&mut self, run_length: i32, entry: ShapeEntry) {
        self.entries.insert(run_length, entry);
    }

    #[inline]
    pub fn get(&self, run_length: i32) -> Option<&ShapeEntry> {
        self.entries.get(&run_length)
    }

    #[inline]
    pub fn get_mut(&mut self, run_length: i32) -> Option<&mut ShapeEntry> {
        self.entries.get_mut(&run_length)
    }

    /// The number of distinct run-lengths seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
