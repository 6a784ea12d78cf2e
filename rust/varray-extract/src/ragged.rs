//! Element-level mapping of ragged fields under a variant selection.

use varray_common::{Result, error::Error, verify_dim};
use varray_store::ArrayNode;

use crate::selection::SelectionMask;

/// Upper bound on the number of run-length entries read per store request.
const READ_CHUNK: usize = 16384;

/// The element-level view of a ragged field under a variant selection.
///
/// Covers the raw element range touched by the selection: every element from
/// the first selected variant's data through the last selected variant's
/// data, including elements of unselected variants that fall in between
/// (those must still be read, flagged `false`, and excluded from output).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaggedMapping {
    /// Run-length of each selected variant, in store order.
    pub per_variant_len: Vec<i32>,
    /// One flag per raw element in the touched range: `true` for elements
    /// belonging to selected variants.
    pub element_selection: Vec<bool>,
    /// Total run-length of all variants strictly before the first selected
    /// one; the flat start of the touched range.
    pub element_range_start: u64,
    /// The size of the touched range, `element_selection.len()`.
    pub element_count: u64,
}

/// Maps a 1-D run-length index array plus a variant selection mask to the
/// element-level [`RaggedMapping`].
///
/// Negative run-lengths are clamped to zero. An entirely unselected mask
/// yields an empty mapping; a mask whose length differs from the index
/// length fails with a `Dimension` error naming the index path. The index
/// array is scanned in bounded-size chunks so arbitrarily long cohorts do
/// not spike memory.
pub fn map_run_length_index(
    index: &dyn ArrayNode,
    mask: &SelectionMask,
) -> Result<RaggedMapping> {
    verify_dim!(index.path(), index.dimensions().len() == 1);
    let total = index.total_count() as usize;

    let Some(flags) = mask.flags() else {
        return map_full(index, total);
    };
    if flags.len() != total {
        return Err(Error::dimension(index.path()));
    }

    let Some(first) = flags.iter().position(|&b| b) else {
        return Ok(RaggedMapping::default());
    };
    let last = flags.iter().rposition(|&b| b).expect("a selected position");

    let mut chunk = vec![0i32; READ_CHUNK.min(total)];
    let mut mapping = RaggedMapping::default();

    // Prefix sum of everything before the first selected variant.
    let mut pos = 0usize;
    while pos < first {
        let len = (first - pos).min(READ_CHUNK);
        index.read_i32(pos as u64, &mut chunk[..len])?;
        for &value in &chunk[..len] {
            if value > 0 {
                mapping.element_range_start += value as u64;
            }
        }
        pos += len;
    }

    // The touched range: first..=last, selected and unselected interleaved.
    while pos <= last {
        let len = (last - pos + 1).min(READ_CHUNK);
        index.read_i32(pos as u64, &mut chunk[..len])?;
        for (i, &value) in chunk[..len].iter().enumerate() {
            let run = value.max(0);
            let selected = flags[pos + i];
            if selected {
                mapping.per_variant_len.push(run);
            }
            mapping
                .element_selection
                .extend(std::iter::repeat_n(selected, run as usize));
        }
        pos += len;
    }

    mapping.element_count = mapping.element_selection.len() as u64;
    Ok(mapping)
}

/// The select-all fast path: one pass over the whole index.
fn map_full(index: &dyn ArrayNode, total: usize) -> Result<RaggedMapping> {
    let mut mapping = RaggedMapping::default();
    mapping.per_variant_len.reserve(total);

    let mut chunk = vec![0i32; READ_CHUNK.min(total.max(1))];
    let mut pos = 0usize;
    while pos < total {
        let len = (total - pos).min(READ_CHUNK);
        index.read_i32(pos as u64, &mut chunk[..len])?;
        for &value in &chunk[..len] {
            let run = value.max(0);
            mapping.per_variant_len.push(run);
            mapping.element_count += run as u64;
        }
        pos += len;
    }

    mapping.element_selection = vec![true; mapping.element_count as usize];
    Ok(mapping)
}
