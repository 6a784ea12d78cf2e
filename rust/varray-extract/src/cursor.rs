//! Per-field cursors over the selected variant subset.

use std::sync::Arc;

use varray_common::{Result, error::Error, verify_dim};
use varray_store::{ArrayNode, ArrayStore, AxisSelection, ElementType, ValueBuffer};

use crate::field::{FieldShapeClass, classify_field, index_path_of};
use crate::genotype::{GenotypeDecoder, GenotypeScratch};
use crate::selection::CompiledSelection;
use crate::shape::{BufferShape, BufferShapeCache, ShapeEntry};

/// A stateful cursor over one field, stepping variant by variant through the
/// selected subset.
///
/// The cursor owns the per-field state exclusively: the raw variant index
/// (monotonically increasing), the cumulative storage-cell offset, and the
/// run-length of the current variant (how many storage cells it occupies).
/// For field families without an auxiliary run-length index the run-length
/// is the degenerate constant 1 and the cell offset equals the raw variant
/// index; the same [`advance`](FieldCursor::advance) algorithm services both
/// cases.
pub struct FieldCursor<'a> {
    name: String,
    class: FieldShapeClass,
    node: Arc<dyn ArrayNode>,
    index: Option<Arc<dyn ArrayNode>>,
    selection: &'a CompiledSelection,
    dims: Vec<usize>,
    decoder: Option<GenotypeDecoder>,
    shapes: BufferShapeCache,
    variant_index: usize,
    cell_offset: u64,
    cells_for_variant: i32,
}

impl<'a> FieldCursor<'a> {
    /// Opens a cursor for the named field, validating the field's on-disk
    /// shape against its family and positioning at the first selected
    /// variant.
    pub fn open(
        store: &dyn ArrayStore,
        name: &str,
        selection: &'a CompiledSelection,
    ) -> Result<FieldCursor<'a>> {
        let spec = classify_field(name)?;
        let node = store.resolve(&spec.data_path)?;
        let dims = node.dimensions().to_vec();
        let total_variants = selection.total_variants();
        let total_samples = selection.total_samples();
        let path = &spec.data_path;

        let mut index = None;
        let mut decoder = None;
        match spec.class {
            FieldShapeClass::Basic => {
                verify_dim!(path, dims.len() == 1);
                verify_dim!(path, node.total_count() == total_variants as u64);
            }
            FieldShapeClass::SampleBasic => {
                return Err(Error::invalid_configuration(
                    name,
                    "sample-axis fields support whole-column reads only",
                ));
            }
            FieldShapeClass::Genotype => {
                verify_dim!(path, dims.len() == 3);
                verify_dim!(path, dims[0] >= total_variants);
                verify_dim!(path, dims[1] == total_samples);
                index = Some(require_index(store, path, total_variants)?);
                decoder = Some(GenotypeDecoder::new(dims[1], dims[2]));
            }
            FieldShapeClass::Phase => {
                verify_dim!(path, dims.len() == 2 || dims.len() == 3);
                verify_dim!(path, dims[0] == total_variants);
                verify_dim!(path, dims[1] == total_samples);
            }
            FieldShapeClass::Info => {
                verify_dim!(path, dims.len() == 1 || dims.len() == 2);
                index = optional_index(store, path, total_variants)?;
                if index.is_none() {
                    verify_dim!(path, dims[0] == total_variants);
                }
            }
            FieldShapeClass::Format => {
                verify_dim!(path, dims.len() == 2 || dims.len() == 3);
                verify_dim!(path, dims[1] == total_samples);
                index = Some(require_index(store, path, total_variants)?);
            }
        }

        let mut cursor = FieldCursor {
            name: name.to_string(),
            class: spec.class,
            node,
            index,
            selection,
            dims,
            decoder,
            shapes: BufferShapeCache::new(),
            variant_index: 0,
            cell_offset: 0,
            cells_for_variant: 0,
        };

        if total_variants > 0 {
            cursor.cells_for_variant = match &cursor.index {
                Some(index) => read_run_length(index.as_ref(), 0)?,
                None => 1,
            };
            if !selection.variant_selected(0) {
                cursor.advance()?;
            }
        }
        log::trace!(
            "opened cursor for '{}' at variant {} (cells {})",
            cursor.name,
            cursor.variant_index,
            cursor.cells_for_variant
        );
        Ok(cursor)
    }

    /// The requested field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw (store-order) index of the current variant.
    #[inline]
    pub fn variant_index(&self) -> usize {
        self.variant_index
    }

    /// The cumulative storage-cell offset of the current variant.
    #[inline]
    pub fn cell_offset(&self) -> u64 {
        self.cell_offset
    }

    /// The number of storage cells the current variant occupies.
    #[inline]
    pub fn cells_for_variant(&self) -> i32 {
        self.cells_for_variant
    }

    /// Returns `true` once the cursor has stepped past the last raw variant.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.variant_index >= self.selection.total_variants()
    }

    /// Advances to the next selected variant, accumulating the run-lengths
    /// of skipped unselected variants into the cell offset.
    ///
    /// Returns `false` when the raw position reaches the total variant
    /// count; calling again in that terminal state keeps returning `false`
    /// with no further state changes.
    pub fn advance(&mut self) -> Result<bool> {
        let total = self.selection.total_variants();
        if self.variant_index >= total {
            return Ok(false);
        }
        self.variant_index += 1;
        self.cell_offset += self.cells_for_variant.max(0) as u64;

        if let Some(index) = self.index.clone() {
            while self.variant_index < total && !self.selection.variant_selected(self.variant_index)
            {
                let run = read_run_length(index.as_ref(), self.variant_index as u64)?;
                self.cell_offset += run as u64;
                self.variant_index += 1;
            }
            self.cells_for_variant = if self.variant_index < total {
                read_run_length(index.as_ref(), self.variant_index as u64)?
            } else {
                0
            };
        } else {
            while self.variant_index < total && !self.selection.variant_selected(self.variant_index)
            {
                self.variant_index += 1;
            }
            self.cell_offset = self.variant_index as u64;
            self.cells_for_variant = if self.variant_index < total { 1 } else { 0 };
        }
        Ok(self.variant_index < total)
    }

    /// Decodes the current variant into the cached buffer for its
    /// run-length, creating the shape descriptor on first sight.
    pub fn fill_current(&mut self, scratch: &mut GenotypeScratch) -> Result<()> {
        let cells = self.cells_for_variant;
        if !self.shapes.contains(cells) {
            let shape = shape_for(
                self.class,
                &self.dims,
                self.selection.selected_samples(),
                cells,
            );
            let element_type = match self.class {
                FieldShapeClass::Genotype => ElementType::Integer,
                _ => self.node.element_type(),
            };
            let buffer = ValueBuffer::zeroed(element_type, shape.element_count);
            self.shapes.insert(cells, ShapeEntry { shape, buffer });
        }
        let entry = self.shapes.get_mut(cells).expect("cached shape entry");

        if self.class == FieldShapeClass::Genotype {
            let out = entry.buffer.reset_ints();
            out.resize(entry.shape.element_count, 0);
            if cells > 0 {
                self.decoder.expect("genotype decoder").decode(
                    self.node.as_ref(),
                    self.cell_offset,
                    cells as usize,
                    self.selection.sample_flags(),
                    scratch,
                    out,
                )?;
            }
            return Ok(());
        }

        let window = cells.max(0) as usize;
        let sample_flags = self.selection.sample_flags();
        let mut start = vec![0u64; self.dims.len()];
        start[0] = self.cell_offset;
        let mut count = self.dims.clone();
        count[0] = window;
        let mut axes = vec![AxisSelection::All; self.dims.len()];
        if matches!(self.class, FieldShapeClass::Phase | FieldShapeClass::Format) {
            // The axis-0 window already covers exactly the current variant's
            // cells; only the sample axis needs a mask.
            axes[1] = AxisSelection::Mask(sample_flags);
        }
        self.node
            .read_selected(&start, &count, &axes, &mut entry.buffer)?;
        debug_assert_eq!(entry.buffer.len(), entry.shape.element_count);
        Ok(())
    }

    /// The shape and buffer filled by the last [`fill_current`] call.
    ///
    /// # Panics
    ///
    /// Panics if `fill_current` has not run for the current run-length.
    pub fn current(&self) -> (&BufferShape, &ValueBuffer) {
        let entry = self
            .shapes
            .get(self.cells_for_variant)
            .expect("fill_current before current");
        (&entry.shape, &entry.buffer)
    }

    /// The number of distinct run-lengths whose shapes were memoized so far.
    pub fn cached_shape_count(&self) -> usize {
        self.shapes.len()
    }
}

impl std::fmt::Debug for FieldCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCursor")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("variant_index", &self.variant_index)
            .field("cell_offset", &self.cell_offset)
            .field("cells_for_variant", &self.cells_for_variant)
            .finish_non_exhaustive()
    }
}

/// Computes the output shape for one variant of a field, given its family,
/// on-disk dimensions, selected sample count and run-length.
fn shape_for(
    class: FieldShapeClass,
    dims: &[usize],
    selected_samples: usize,
    cells: i32,
) -> BufferShape {
    let cells = cells.max(0) as usize;
    match class {
        FieldShapeClass::Basic => BufferShape::flat(1),
        FieldShapeClass::SampleBasic => BufferShape::flat(selected_samples),
        FieldShapeClass::Genotype => {
            // A variant without call data yields no buffer at all, not a
            // fabricated layer of reference calls.
            if cells == 0 {
                BufferShape::flat(0)
            } else {
                BufferShape::labeled(vec![dims[2], selected_samples], vec!["allele", "sample"])
            }
        }
        FieldShapeClass::Phase => {
            if dims.len() > 2 {
                BufferShape::labeled(vec![dims[2], selected_samples], vec!["allele", "sample"])
            } else {
                BufferShape::flat(selected_samples)
            }
        }
        FieldShapeClass::Info => {
            let width = if dims.len() > 1 { dims[1] } else { 1 };
            BufferShape::flat(width * cells)
        }
        FieldShapeClass::Format => {
            if dims.len() > 2 {
                BufferShape::labeled(
                    vec![dims[2], selected_samples, cells],
                    vec!["ploidy", "sample", "variant"],
                )
            } else {
                BufferShape::labeled(vec![selected_samples, cells], vec!["sample", "variant"])
            }
        }
    }
}

/// Resolves a mandatory auxiliary run-length index, failing with
/// `MissingIndex` when absent.
fn require_index(
    store: &dyn ArrayStore,
    data_path: &str,
    total_variants: usize,
) -> Result<Arc<dyn ArrayNode>> {
    let index_path = index_path_of(data_path);
    let index = store
        .try_resolve(&index_path)?
        .ok_or_else(|| Error::missing_index(&index_path))?;
    validate_index(index.as_ref(), total_variants)?;
    Ok(index)
}

/// Resolves an optional auxiliary run-length index, validating it when
/// present.
fn optional_index(
    store: &dyn ArrayStore,
    data_path: &str,
    total_variants: usize,
) -> Result<Option<Arc<dyn ArrayNode>>> {
    let index_path = index_path_of(data_path);
    match store.try_resolve(&index_path)? {
        Some(index) => {
            validate_index(index.as_ref(), total_variants)?;
            Ok(Some(index))
        }
        None => Ok(None),
    }
}

fn validate_index(index: &dyn ArrayNode, total_variants: usize) -> Result<()> {
    verify_dim!(index.path(), index.dimensions().len() == 1);
    verify_dim!(index.path(), index.total_count() == total_variants as u64);
    Ok(())
}

/// Reads one run-length entry, clamped to be non-negative.
fn read_run_length(index: &dyn ArrayNode, position: u64) -> Result<i32> {
    let mut one = [0i32; 1];
    index.read_i32(position, &mut one)?;
    Ok(one[0].max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{CompiledSelection, Selection};
    use varray_common::error::ErrorKind;
    use varray_store::memory::MemoryStore;

    fn ragged_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.put_i32("annotation/info/@AC", vec![5], vec![2, 0, 1, 3, 0]);
        store.put_i32("annotation/info/AC", vec![6], vec![10, 11, 12, 13, 14, 15]);
        store.put_i32("position", vec![5], vec![101, 102, 103, 104, 105]);
        store
    }

    fn compile(variants: Vec<bool>, samples: usize) -> CompiledSelection {
        let selection = Selection::everything().with_variants(variants);
        CompiledSelection::compile(&selection, 5, samples).unwrap()
    }

    #[test]
    fn ragged_cursor_tracks_offsets_through_gaps() {
        let store = ragged_store();
        let selection = compile(vec![false, true, true, false, true], 1);
        let mut cursor = FieldCursor::open(&store, "annotation/info/AC", &selection).unwrap();

        // Variant 0 (2 cells) is unselected; the cursor opens at variant 1.
        assert_eq!(cursor.variant_index(), 1);
        assert_eq!(cursor.cell_offset(), 2);
        assert_eq!(cursor.cells_for_variant(), 0);

        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.variant_index(), 2);
        assert_eq!(cursor.cell_offset(), 2);
        assert_eq!(cursor.cells_for_variant(), 1);

        // Variant 3 (3 cells) is skipped on the way to variant 4.
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.variant_index(), 4);
        assert_eq!(cursor.cell_offset(), 6);
        assert_eq!(cursor.cells_for_variant(), 0);

        assert!(!cursor.advance().unwrap());
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn advance_is_idempotent_after_terminal_state() {
        let store = ragged_store();
        let selection = compile(vec![true, false, false, false, false], 1);
        let mut cursor = FieldCursor::open(&store, "position", &selection).unwrap();
        assert!(!cursor.advance().unwrap());
        let (index, offset) = (cursor.variant_index(), cursor.cell_offset());
        for _ in 0..3 {
            assert!(!cursor.advance().unwrap());
            assert_eq!(cursor.variant_index(), index);
            assert_eq!(cursor.cell_offset(), offset);
        }
    }

    #[test]
    fn dense_cursor_offset_equals_variant_index() {
        let store = ragged_store();
        let selection = compile(vec![true, false, true, true, false], 1);
        let mut cursor = FieldCursor::open(&store, "position", &selection).unwrap();
        assert_eq!(cursor.variant_index(), 0);
        assert_eq!(cursor.cells_for_variant(), 1);

        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.variant_index(), 2);
        assert_eq!(cursor.cell_offset(), 2);

        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.variant_index(), 3);
        assert!(!cursor.advance().unwrap());
    }

    #[test]
    fn fill_reads_the_current_cells_only() {
        let store = ragged_store();
        let selection = compile(vec![false, false, true, false, true], 1);
        let mut cursor = FieldCursor::open(&store, "annotation/info/AC", &selection).unwrap();
        let mut scratch = GenotypeScratch::new();

        cursor.fill_current(&mut scratch).unwrap();
        let (shape, buffer) = cursor.current();
        assert_eq!(shape.element_count, 1);
        assert_eq!(buffer.as_ints(), Some(&[12][..]));

        assert!(cursor.advance().unwrap());
        cursor.fill_current(&mut scratch).unwrap();
        let (shape, buffer) = cursor.current();
        assert_eq!(shape.element_count, 0);
        assert!(buffer.is_empty());
        assert_eq!(cursor.cached_shape_count(), 2);
    }

    #[test]
    fn basic_field_shape_mismatch() {
        let mut store = MemoryStore::new();
        store.put_i32("position", vec![2, 2], vec![1, 2, 3, 4]);
        let selection = compile(vec![true; 5], 1);
        let err = FieldCursor::open(&store, "position", &selection).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Dimension { path } if path == "position"));
    }

    #[test]
    fn format_without_index_is_fatal() {
        let mut store = MemoryStore::new();
        store.put_i32("annotation/format/DP/data", vec![5, 1], vec![0; 5]);
        let selection = compile(vec![true; 5], 1);
        let err = FieldCursor::open(&store, "annotation/format/DP", &selection).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::MissingIndex { path } if path == "annotation/format/DP/@data"
        ));
    }

    #[test]
    fn debug_output_reports_the_walk_state() {
        let store = ragged_store();
        let selection = compile(vec![true; 5], 1);
        let cursor = FieldCursor::open(&store, "position", &selection).unwrap();
        let rendered = format!("{cursor:?}");
        assert!(rendered.contains("\"position\""));
        assert!(rendered.contains("variant_index: 0"));
    }

    #[test]
    fn unknown_path_is_not_found() {
        let store = MemoryStore::new();
        let selection = compile(vec![true; 5], 1);
        let err = FieldCursor::open(&store, "allele", &selection).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NotFound { path } if path == "allele"));
    }
}
