//! Lockstep multi-field iteration and callback result aggregation.

use std::str::FromStr;

use varray_common::{Result, error::Error};
use varray_store::{ArrayStore, ValueBuffer};

use crate::MISSING_INT;
use crate::cursor::FieldCursor;
use crate::genotype::GenotypeScratch;
use crate::selection::{CompiledSelection, Selection};
use crate::shape::BufferShape;

/// The meaning of the optional index handed to the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMode {
    /// No index is passed.
    #[default]
    None,
    /// 1-based position within the selection.
    Relative,
    /// 1-based absolute position in the full store.
    Absolute,
}

impl FromStr for IndexMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<IndexMode> {
        match s {
            "none" => Ok(IndexMode::None),
            "relative" => Ok(IndexMode::Relative),
            "absolute" => Ok(IndexMode::Absolute),
            _ => Err(Error::invalid_configuration(
                s,
                "unrecognized index mode; expected none, relative or absolute",
            )),
        }
    }
}

/// How per-step callback results are coerced into the output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultMode {
    /// First element of each result as an integer.
    Integer,
    /// First element of each result as a float.
    Double,
    /// First element of each result as text.
    Character,
    /// Each result kept whole.
    #[default]
    List,
    /// Results are discarded.
    None,
}

impl FromStr for ResultMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<ResultMode> {
        match s {
            "integer" => Ok(ResultMode::Integer),
            "double" => Ok(ResultMode::Double),
            "character" => Ok(ResultMode::Character),
            "list" => Ok(ResultMode::List),
            "none" => Ok(ResultMode::None),
            _ => Err(Error::invalid_configuration(
                s,
                "unrecognized result mode; expected integer, double, character, list or none",
            )),
        }
    }
}

/// Configuration of one apply session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub index_mode: IndexMode,
    pub result_mode: ResultMode,
}

/// One field's contribution to an assembled record: the requested name, the
/// buffer shape and the decoded values for the current variant.
#[derive(Debug, Clone, Copy)]
pub struct RecordField<'a> {
    pub name: &'a str,
    pub shape: &'a BufferShape,
    pub values: &'a ValueBuffer,
}

/// The record handed to the callback at each step: a single buffer when one
/// field was requested, an ordered named collection otherwise.
#[derive(Debug, Clone)]
pub enum Record<'a> {
    Single(RecordField<'a>),
    Fields(Vec<RecordField<'a>>),
}

/// One callback invocation: the assembled record plus the optional index.
#[derive(Debug, Clone)]
pub struct Step<'a> {
    pub index: Option<u64>,
    pub record: Record<'a>,
}

/// A value returned by the callback, to be coerced per the result mode.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    Ints(Vec<i32>),
    Doubles(Vec<f64>),
    Strings(Vec<String>),
}

/// The aggregated output of one apply session.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractOutput {
    Ints(Vec<i32>),
    Doubles(Vec<f64>),
    Strings(Vec<Option<String>>),
    List(Vec<StepValue>),
    None,
}

/// Streams one record per selected variant to `callback`, coercing its
/// results into the configured output container.
///
/// One cursor is constructed per requested field; all cursors walk the same
/// selected-variant sequence and the loop ends as soon as any of them
/// exhausts. A failure in validation, decode or the callback aborts the
/// whole call; no partial output is returned.
pub fn apply<F>(
    store: &dyn ArrayStore,
    field_names: &[&str],
    selection: &Selection,
    options: &ApplyOptions,
    mut callback: F,
) -> Result<ExtractOutput>
where
    F: FnMut(Step<'_>) -> Result<StepValue>,
{
    if field_names.is_empty() {
        return Err(Error::invalid_configuration(
            "field_names",
            "at least one field must be requested",
        ));
    }

    let (total_variants, total_samples) = axis_totals(store, selection)?;
    let compiled = CompiledSelection::compile(selection, total_variants, total_samples)?;
    if compiled.selected_variants() == 0 {
        return Err(Error::empty_selection());
    }
    log::debug!(
        "apply over {} field(s): {}/{} variants, {}/{} samples selected",
        field_names.len(),
        compiled.selected_variants(),
        total_variants,
        compiled.selected_samples(),
        total_samples
    );

    let mut cursors = field_names
        .iter()
        .map(|name| FieldCursor::open(store, name, &compiled))
        .collect::<Result<Vec<_>>>()?;

    let mut scratch = GenotypeScratch::new();
    let mut output = new_output(options.result_mode, compiled.selected_variants());
    let mut step_count = 0u64;

    loop {
        for cursor in cursors.iter_mut() {
            cursor.fill_current(&mut scratch)?;
        }
        let index = match options.index_mode {
            IndexMode::None => None,
            IndexMode::Relative => Some(step_count + 1),
            IndexMode::Absolute => Some(cursors[0].variant_index() as u64 + 1),
        };
        let record = if cursors.len() == 1 {
            Record::Single(record_field(&cursors[0]))
        } else {
            Record::Fields(cursors.iter().map(record_field).collect())
        };

        let value = callback(Step { index, record })?;
        push_step(&mut output, value);
        step_count += 1;

        let mut ended = false;
        for cursor in cursors.iter_mut() {
            if !cursor.advance()? {
                ended = true;
                break;
            }
        }
        if ended {
            break;
        }
    }
    Ok(output)
}

fn record_field<'c>(cursor: &'c FieldCursor<'_>) -> RecordField<'c> {
    let (shape, values) = cursor.current();
    RecordField {
        name: cursor.name(),
        shape,
        values,
    }
}

/// Resolves the axis cardinalities: from the masks when given, otherwise
/// from the store's `variant.id` / `sample.id` nodes.
pub(crate) fn axis_totals(store: &dyn ArrayStore, selection: &Selection) -> Result<(usize, usize)> {
    let total_variants = match selection.variants.flags() {
        Some(flags) => flags.len(),
        None => store.resolve("variant.id")?.total_count() as usize,
    };
    let total_samples = match selection.samples.flags() {
        Some(flags) => flags.len(),
        None => store.resolve("sample.id")?.total_count() as usize,
    };
    Ok((total_variants, total_samples))
}

fn new_output(mode: ResultMode, capacity: usize) -> ExtractOutput {
    match mode {
        ResultMode::Integer => ExtractOutput::Ints(Vec::with_capacity(capacity)),
        ResultMode::Double => ExtractOutput::Doubles(Vec::with_capacity(capacity)),
        ResultMode::Character => ExtractOutput::Strings(Vec::with_capacity(capacity)),
        ResultMode::List => ExtractOutput::List(Vec::with_capacity(capacity)),
        ResultMode::None => ExtractOutput::None,
    }
}

fn push_step(output: &mut ExtractOutput, value: StepValue) {
    match output {
        ExtractOutput::Ints(out) => out.push(first_as_int(&value)),
        ExtractOutput::Doubles(out) => out.push(first_as_double(&value)),
        ExtractOutput::Strings(out) => out.push(first_as_string(&value)),
        ExtractOutput::List(out) => out.push(value),
        ExtractOutput::None => {}
    }
}

/// Scalar coercions: non-scalar results reduce to their first element, and
/// an empty result becomes the missing marker of the target type.
fn first_as_int(value: &StepValue) -> i32 {
    match value {
        StepValue::Ints(v) => v.first().copied().unwrap_or(MISSING_INT),
        StepValue::Doubles(v) => v.first().map(|&x| x as i32).unwrap_or(MISSING_INT),
        StepValue::Strings(_) => MISSING_INT,
    }
}

fn first_as_double(value: &StepValue) -> f64 {
    match value {
        StepValue::Ints(v) => v
            .first()
            .map(|&x| {
                if x == MISSING_INT {
                    f64::NAN
                } else {
                    x as f64
                }
            })
            .unwrap_or(f64::NAN),
        StepValue::Doubles(v) => v.first().copied().unwrap_or(f64::NAN),
        StepValue::Strings(_) => f64::NAN,
    }
}

fn first_as_string(value: &StepValue) -> Option<String> {
    match value {
        StepValue::Ints(v) => v.first().and_then(|&x| {
            if x == MISSING_INT {
                None
            } else {
                Some(x.to_string())
            }
        }),
        StepValue::Doubles(v) => v.first().and_then(|&x| {
            if x.is_nan() {
                None
            } else {
                Some(x.to_string())
            }
        }),
        StepValue::Strings(v) => v.first().cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use varray_common::error::ErrorKind;

    #[test]
    fn result_mode_parsing() {
        assert_eq!("integer".parse::<ResultMode>().unwrap(), ResultMode::Integer);
        assert_eq!("list".parse::<ResultMode>().unwrap(), ResultMode::List);
        let err = "frame".parse::<ResultMode>().unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidConfiguration { value, .. } if value == "frame"
        ));
    }

    #[test]
    fn index_mode_parsing() {
        assert_eq!("absolute".parse::<IndexMode>().unwrap(), IndexMode::Absolute);
        assert!("sometimes".parse::<IndexMode>().is_err());
    }

    #[test]
    fn scalar_coercion_reduces_to_first_element() {
        let value = StepValue::Ints(vec![7, 8, 9]);
        assert_eq!(first_as_int(&value), 7);
        assert_eq!(first_as_double(&value), 7.0);
        assert_eq!(first_as_string(&value), Some("7".to_string()));
    }

    #[test]
    fn empty_results_become_missing_markers() {
        let value = StepValue::Ints(Vec::new());
        assert_eq!(first_as_int(&value), MISSING_INT);
        assert!(first_as_double(&value).is_nan());
        assert_eq!(first_as_string(&value), None);
    }

    #[test]
    fn missing_int_propagates_across_types() {
        let value = StepValue::Ints(vec![MISSING_INT]);
        assert!(first_as_double(&value).is_nan());
        assert_eq!(first_as_string(&value), None);
    }
}
