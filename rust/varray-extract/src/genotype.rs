//! Decoding of bit-packed multi-ploidy genotype calls.

use varray_common::Result;
use varray_store::ArrayNode;

use crate::MISSING_INT;

/// Session-owned scratch for genotype slide reads.
///
/// Grown on demand to the largest slide ever required in the session, never
/// shrunk. One extraction session owns exactly one scratch; it must not be
/// shared across concurrent sessions.
#[derive(Debug, Default)]
pub struct GenotypeScratch {
    slide: Vec<i32>,
}

impl GenotypeScratch {
    pub fn new() -> GenotypeScratch {
        GenotypeScratch::default()
    }

    fn ensure(&mut self, len: usize) -> &mut [i32] {
        if self.slide.len() < len {
            self.slide.resize(len, 0);
        }
        &mut self.slide[..len]
    }
}

/// Reassembles per-sample genotype codes from one or more packed ploidy
/// slides into a dense integer buffer.
///
/// A slide is one full read of all samples x ploidy-axis values for a single
/// ploidy layer. Slide 0 is copied directly (selected samples only); each
/// subsequent slide `k` is OR-merged shifted left by `2 * k` bits, so every
/// additional layer contributes one more 2-bit call. The missing-value
/// sentinel is the code with every 2-bit layer set to `3`; decoded elements
/// equal to it are replaced with [`MISSING_INT`].
#[derive(Debug, Clone, Copy)]
pub struct GenotypeDecoder {
    sample_count: usize,
    ploidy_width: usize,
}

impl GenotypeDecoder {
    /// Creates a decoder for slides of `sample_count` samples with
    /// `ploidy_width` calls each.
    pub fn new(sample_count: usize, ploidy_width: usize) -> GenotypeDecoder {
        GenotypeDecoder {
            sample_count,
            ploidy_width,
        }
    }

    /// The number of raw elements in one slide.
    #[inline]
    pub fn slide_len(&self) -> usize {
        self.sample_count * self.ploidy_width
    }

    /// Decodes `depth` slides starting at slide index `first_slide` into
    /// `out`, keeping only samples flagged in `sample_flags`.
    ///
    /// `out` must hold exactly `selected samples * ploidy_width` elements;
    /// `sample_flags` must have one flag per sample. The cursor establishes
    /// both `first_slide` (its cell offset) and `depth` (its run-length)
    /// before decode runs.
    pub fn decode(
        &self,
        node: &dyn ArrayNode,
        first_slide: u64,
        depth: usize,
        sample_flags: &[bool],
        scratch: &mut GenotypeScratch,
        out: &mut [i32],
    ) -> Result<()> {
        debug_assert_eq!(sample_flags.len(), self.sample_count);
        let slide_len = self.slide_len();
        let width = self.ploidy_width;
        let slide = scratch.ensure(slide_len);

        node.read_i32(first_slide * slide_len as u64, slide)?;
        let mut p = 0;
        for (i, &keep) in sample_flags.iter().enumerate() {
            if keep {
                out[p..p + width].copy_from_slice(&slide[i * width..(i + 1) * width]);
                p += width;
            }
        }
        debug_assert_eq!(p, out.len());

        let mut missing = 3i32;
        for k in 1..depth {
            node.read_i32((first_slide + k as u64) * slide_len as u64, slide)?;
            let shift = (k * 2) as u32;
            let mut p = 0;
            for (i, &keep) in sample_flags.iter().enumerate() {
                if keep {
                    for j in 0..width {
                        out[p] |= slide[i * width + j] << shift;
                        p += 1;
                    }
                }
            }
            missing = (missing << 2) | 0x03;
        }

        for value in out.iter_mut() {
            if *value == missing {
                *value = MISSING_INT;
            }
        }
        Ok(())
    }
}
