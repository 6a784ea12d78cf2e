//! Field families and field-name classification.

use varray_common::{Result, error::Error};

/// The five recognized field families. The family fixes the dimensionality
/// checks, the auxiliary-index requirements and the output layout, and is
/// selected once when a cursor is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShapeClass {
    /// One scalar per variant (`position`, `chromosome`, ...).
    Basic,
    /// One scalar per sample (`sample.id`); whole-column reads only.
    SampleBasic,
    /// Bit-packed multi-ploidy calls; 3-D, auxiliary index mandatory.
    Genotype,
    /// Dense phasing flags; 2-D or 3-D.
    Phase,
    /// Ragged per-variant annotation; 1-D or 2-D, auxiliary index optional.
    Info,
    /// Ragged per-variant, per-sample annotation; 2-D or 3-D, auxiliary
    /// index mandatory.
    Format,
}

/// A classified field: its family and the store path of its data node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub class: FieldShapeClass,
    pub data_path: String,
}

/// Classifies a requested field name into its family and data path.
///
/// Recognized names: `variant.id`, `position`, `chromosome`, `allele`,
/// `annotation/id`, `annotation/qual`, `annotation/filter` (Basic);
/// `sample.id` (SampleBasic); `genotype` (data at `genotype/data`); `phase`
/// (data at `phase/data`); `annotation/info/NAME`; `annotation/format/NAME`
/// (data at `annotation/format/NAME/data`). Anything else fails with
/// `InvalidFieldName`.
pub fn classify_field(name: &str) -> Result<FieldSpec> {
    let spec = |class, data_path: String| FieldSpec { class, data_path };
    match name {
        "variant.id" | "position" | "chromosome" | "allele" | "annotation/id"
        | "annotation/qual" | "annotation/filter" => {
            Ok(spec(FieldShapeClass::Basic, name.to_string()))
        }
        "sample.id" => Ok(spec(FieldShapeClass::SampleBasic, name.to_string())),
        "genotype" => Ok(spec(FieldShapeClass::Genotype, "genotype/data".to_string())),
        "phase" => Ok(spec(FieldShapeClass::Phase, "phase/data".to_string())),
        _ => {
            if let Some(rest) = name.strip_prefix("annotation/info/") {
                if valid_leaf(rest) {
                    return Ok(spec(FieldShapeClass::Info, name.to_string()));
                }
            } else if let Some(rest) = name.strip_prefix("annotation/format/") {
                if valid_leaf(rest) {
                    return Ok(spec(FieldShapeClass::Format, format!("{name}/data")));
                }
            }
            Err(Error::invalid_field_name(name))
        }
    }
}

/// Auxiliary-index names are reserved (leading `@`), and the leaf must be a
/// single path component.
fn valid_leaf(leaf: &str) -> bool {
    !leaf.is_empty() && !leaf.contains('/') && !leaf.starts_with('@')
}

/// Derives the auxiliary run-length index path of a data path: the final
/// path component prefixed with `@` (`genotype/data` -> `genotype/@data`).
pub fn index_path_of(data_path: &str) -> String {
    match data_path.rsplit_once('/') {
        Some((parent, leaf)) => format!("{parent}/@{leaf}"),
        None => format!("@{data_path}"),
    }
}
