//! Selection masks over the variant and sample axes.

use varray_common::{Result, error::Error};

/// A boolean selection over one store axis.
///
/// An empty mask is the "select all" sentinel; a non-empty mask must have
/// exactly one flag per position of the axis it selects over, which is
/// verified once when the selection is compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionMask(Vec<bool>);

impl SelectionMask {
    /// The select-all sentinel.
    pub fn all() -> SelectionMask {
        SelectionMask(Vec::new())
    }

    /// A mask selecting exactly the flagged positions.
    pub fn from_flags(flags: Vec<bool>) -> SelectionMask {
        SelectionMask(flags)
    }

    /// Returns `true` if this is the select-all sentinel.
    #[inline]
    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the explicit flags, or `None` for the select-all sentinel.
    #[inline]
    pub fn flags(&self) -> Option<&[bool]> {
        if self.is_all() { None } else { Some(&self.0) }
    }

    /// Counts the selected positions over an axis of `total` positions.
    ///
    /// The select-all sentinel selects all `total` positions; otherwise the
    /// mask length must equal `total`, failing with a `Dimension` error that
    /// names `axis`.
    pub fn count_selected(&self, total: usize, axis: &str) -> Result<usize> {
        match self.flags() {
            None => Ok(total),
            Some(flags) => {
                if flags.len() != total {
                    return Err(Error::dimension(axis));
                }
                Ok(flags.iter().filter(|&&b| b).count())
            }
        }
    }
}

impl From<Vec<bool>> for SelectionMask {
    fn from(flags: Vec<bool>) -> SelectionMask {
        SelectionMask::from_flags(flags)
    }
}

/// The raw selection state of one extraction call: a mask per axis.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub variants: SelectionMask,
    pub samples: SelectionMask,
}

impl Selection {
    /// Selects every variant and every sample.
    pub fn everything() -> Selection {
        Selection::default()
    }

    pub fn with_variants(mut self, flags: Vec<bool>) -> Selection {
        self.variants = SelectionMask::from_flags(flags);
        self
    }

    pub fn with_samples(mut self, flags: Vec<bool>) -> Selection {
        self.samples = SelectionMask::from_flags(flags);
        self
    }
}

/// Selection state compiled against the store's axis cardinalities.
///
/// Compilation validates mask lengths once, materializes the per-axis flags
/// (resolving the select-all sentinel to all-true) and fixes the selected
/// counts. The result is immutable for the rest of the session.
#[derive(Debug, Clone)]
pub struct CompiledSelection {
    variant_flags: Vec<bool>,
    sample_flags: Vec<bool>,
    selected_variants: usize,
    selected_samples: usize,
}

impl CompiledSelection {
    pub fn compile(
        selection: &Selection,
        total_variants: usize,
        total_samples: usize,
    ) -> Result<CompiledSelection> {
        let selected_variants = selection
            .variants
            .count_selected(total_variants, "variant selection")?;
        let selected_samples = selection
            .samples
            .count_selected(total_samples, "sample selection")?;
        let variant_flags = match selection.variants.flags() {
            Some(flags) => flags.to_vec(),
            None => vec![true; total_variants],
        };
        let sample_flags = match selection.samples.flags() {
            Some(flags) => flags.to_vec(),
            None => vec![true; total_samples],
        };
        Ok(CompiledSelection {
            variant_flags,
            sample_flags,
            selected_variants,
            selected_samples,
        })
    }

    #[inline]
    pub fn total_variants(&self) -> usize {
        self.variant_flags.len()
    }

    #[inline]
    pub fn total_samples(&self) -> usize {
        self.sample_flags.len()
    }

    #[inline]
    pub fn selected_variants(&self) -> usize {
        self.selected_variants
    }

    #[inline]
    pub fn selected_samples(&self) -> usize {
        self.selected_samples
    }

    #[inline]
    pub fn variant_selected(&self, index: usize) -> bool {
        self.variant_flags[index]
    }

    #[inline]
    pub fn variant_flags(&self) -> &[bool] {
        &self.variant_flags
    }

    #[inline]
    pub fn sample_flags(&self) -> &[bool] {
        &self.sample_flags
    }
}
