//! One-shot whole-column reads under the current selection.

use varray_common::{Result, error::Error, verify_dim};
use varray_store::{ArrayStore, AxisSelection, ValueBuffer};

use crate::MISSING_INT;
use crate::cursor::FieldCursor;
use crate::field::{FieldShapeClass, classify_field, index_path_of};
use crate::genotype::GenotypeScratch;
use crate::ragged::map_run_length_index;
use crate::selection::{CompiledSelection, Selection, SelectionMask};
use crate::shape::BufferShape;

/// A whole column read in one call.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// A dense field: one shaped buffer.
    Dense {
        shape: BufferShape,
        values: ValueBuffer,
    },
    /// A ragged field: the per-selected-variant lengths alongside the
    /// flattened data of the selected variants.
    Ragged {
        lengths: Vec<i32>,
        shape: BufferShape,
        values: ValueBuffer,
    },
}

/// Reads a single field across all selected variants in one call.
///
/// Dense families (Basic, SampleBasic, Phase) read with per-axis selection
/// directly;
/// ragged families (Info, Format) go through the run-length index mapping
/// and also return per-variant lengths; Genotype decodes every selected
/// variant into one dense `allele x sample x variant` buffer.
pub fn read_field(store: &dyn ArrayStore, name: &str, selection: &Selection) -> Result<Column> {
    let spec = classify_field(name)?;
    let path = &spec.data_path;
    match spec.class {
        FieldShapeClass::Basic => {
            let node = store.resolve(path)?;
            verify_dim!(path, node.dimensions().len() == 1);
            let total = node.dimensions()[0];
            let axis = mask_axis(&selection.variants, total, path)?;
            let mut values = ValueBuffer::default();
            node.read_selected(&[0], &[total], &[axis], &mut values)?;
            Ok(Column::Dense {
                shape: BufferShape::flat(values.len()),
                values,
            })
        }
        FieldShapeClass::SampleBasic => {
            let node = store.resolve(path)?;
            verify_dim!(path, node.dimensions().len() == 1);
            let total = node.dimensions()[0];
            let axis = mask_axis(&selection.samples, total, path)?;
            let mut values = ValueBuffer::default();
            node.read_selected(&[0], &[total], &[axis], &mut values)?;
            Ok(Column::Dense {
                shape: BufferShape::flat(values.len()),
                values,
            })
        }
        FieldShapeClass::Phase => {
            let node = store.resolve(path)?;
            let dims = node.dimensions().to_vec();
            verify_dim!(path, dims.len() == 2 || dims.len() == 3);
            let selected_variants = selection.variants.count_selected(dims[0], path)?;
            let selected_samples = selection.samples.count_selected(dims[1], path)?;
            let v_axis = mask_axis(&selection.variants, dims[0], path)?;
            let s_axis = mask_axis(&selection.samples, dims[1], path)?;

            let start = vec![0u64; dims.len()];
            let mut axes = vec![AxisSelection::All; dims.len()];
            axes[0] = v_axis;
            axes[1] = s_axis;
            let mut values = ValueBuffer::default();
            node.read_selected(&start, &dims, &axes, &mut values)?;

            let shape = if dims.len() > 2 {
                BufferShape {
                    element_count: values.len(),
                    dims: vec![dims[2], selected_samples, selected_variants],
                    axis_labels: Vec::new(),
                }
            } else {
                BufferShape {
                    element_count: values.len(),
                    dims: vec![selected_samples, selected_variants],
                    axis_labels: Vec::new(),
                }
            };
            Ok(Column::Dense { shape, values })
        }
        FieldShapeClass::Info => {
            let node = store.resolve(path)?;
            let dims = node.dimensions().to_vec();
            verify_dim!(path, dims.len() == 1 || dims.len() == 2);
            match store.try_resolve(&index_path_of(path))? {
                None => {
                    let axis = mask_axis(&selection.variants, dims[0], path)?;
                    let start = vec![0u64; dims.len()];
                    let mut axes = vec![AxisSelection::All; dims.len()];
                    axes[0] = axis;
                    let mut values = ValueBuffer::default();
                    node.read_selected(&start, &dims, &axes, &mut values)?;
                    Ok(Column::Dense {
                        shape: BufferShape::flat(values.len()),
                        values,
                    })
                }
                Some(index) => {
                    let mapping = map_run_length_index(index.as_ref(), &selection.variants)?;
                    let mut start = vec![0u64; dims.len()];
                    start[0] = mapping.element_range_start;
                    let mut count = dims.clone();
                    count[0] = mapping.element_count as usize;
                    let mut axes = vec![AxisSelection::All; dims.len()];
                    axes[0] = AxisSelection::Mask(&mapping.element_selection);
                    let mut values = ValueBuffer::default();
                    node.read_selected(&start, &count, &axes, &mut values)?;
                    Ok(Column::Ragged {
                        lengths: mapping.per_variant_len,
                        shape: BufferShape::flat(values.len()),
                        values,
                    })
                }
            }
        }
        FieldShapeClass::Format => {
            let node = store.resolve(path)?;
            let dims = node.dimensions().to_vec();
            verify_dim!(path, dims.len() == 2 || dims.len() == 3);
            let index_path = index_path_of(path);
            let index = store
                .try_resolve(&index_path)?
                .ok_or_else(|| Error::missing_index(&index_path))?;
            let mapping = map_run_length_index(index.as_ref(), &selection.variants)?;
            let s_axis = mask_axis(&selection.samples, dims[1], path)?;

            let mut start = vec![0u64; dims.len()];
            start[0] = mapping.element_range_start;
            let mut count = dims.clone();
            count[0] = mapping.element_count as usize;
            let mut axes = vec![AxisSelection::All; dims.len()];
            axes[0] = AxisSelection::Mask(&mapping.element_selection);
            axes[1] = s_axis;
            let mut values = ValueBuffer::default();
            node.read_selected(&start, &count, &axes, &mut values)?;

            let axis_labels = if dims.len() > 2 {
                vec!["ploidy", "sample", "variant"]
            } else {
                vec!["sample", "variant"]
            };
            Ok(Column::Ragged {
                lengths: mapping.per_variant_len,
                shape: BufferShape {
                    element_count: values.len(),
                    dims: Vec::new(),
                    axis_labels,
                },
                values,
            })
        }
        FieldShapeClass::Genotype => {
            let (total_variants, total_samples) =
                crate::driver::axis_totals(store, selection)?;
            let compiled = CompiledSelection::compile(selection, total_variants, total_samples)?;
            if compiled.selected_variants() == 0 {
                return Ok(Column::Dense {
                    shape: BufferShape::flat(0),
                    values: ValueBuffer::Ints(Vec::new()),
                });
            }

            let mut cursor = FieldCursor::open(store, name, &compiled)?;
            let ploidy_width = store.resolve(path)?.dimensions()[2];
            let layer_len = ploidy_width * compiled.selected_samples();
            let mut scratch = GenotypeScratch::new();
            let mut all = Vec::new();
            loop {
                cursor.fill_current(&mut scratch)?;
                let (_, buffer) = cursor.current();
                match buffer.as_ints() {
                    Some(decoded) if !decoded.is_empty() => all.extend_from_slice(decoded),
                    // A zero-depth variant still occupies its layer of the
                    // dense cube; it carries missing markers, not calls.
                    _ => all.resize(all.len() + layer_len, MISSING_INT),
                }
                if !cursor.advance()? {
                    break;
                }
            }
            Ok(Column::Dense {
                shape: BufferShape {
                    element_count: all.len(),
                    dims: vec![
                        ploidy_width,
                        compiled.selected_samples(),
                        compiled.selected_variants(),
                    ],
                    axis_labels: vec!["allele", "sample", "variant"],
                },
                values: ValueBuffer::Ints(all),
            })
        }
    }
}

/// Validates a mask against an axis cardinality and converts it to a store
/// axis selection.
fn mask_axis<'m>(
    mask: &'m SelectionMask,
    total: usize,
    path: &str,
) -> Result<AxisSelection<'m>> {
    match mask.flags() {
        None => Ok(AxisSelection::All),
        Some(flags) => {
            verify_dim!(path, flags.len() == total);
            Ok(AxisSelection::Mask(flags))
        }
    }
}
