use crate::models::Mutation;
use serde::Serialize;
use std::time::Instant;

/// Mutations found between a reference and a comparison sequence,
/// together with the lengths needed to compute the variation rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariationReport {
    pub mutations: Vec<Mutation>,
    pub reference_len: usize,
    pub comparison_len: usize,
}

impl VariationReport {
    /// Number of mutation records per compared position, as a percentage.
    ///
    /// Trailing insertion/deletion records count as one mutation each.
    /// Defined as `0.0` when either sequence is empty.
    pub fn variation_rate(&self) -> f64 {
        let overlap = self.reference_len.min(self.comparison_len);
        if overlap == 0 {
            return 0.0;
        }
        self.mutations.len() as f64 / overlap as f64 * 100.0
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Position-wise comparison of two sequences.
///
/// This is a single linear pass and NOT an alignment. Every position of
/// the overlapping prefix is compared directly, so one inserted or deleted
/// base in the middle of otherwise identical sequences shows up as a run
/// of substitutions. Whatever is left past the shorter sequence is
/// reported as one trailing insertion (comparison longer) or deletion
/// (reference longer).
pub fn detect_mutations(reference: &str, comparison: &str) -> VariationReport {
    let start = Instant::now();
    let mut mutations = Vec::new();

    let mut ref_chars = reference.char_indices();
    let mut comp_chars = comparison.char_indices();
    let mut position = 0;

    // Byte offsets where the overlap ends in each sequence.
    let (ref_tail, comp_tail) = loop {
        match (ref_chars.next(), comp_chars.next()) {
            (Some((_, r)), Some((_, c))) => {
                if r != c {
                    mutations.push(Mutation::substitution(position, r, c));
                }
                position += 1;
            }
            (Some((ri, _)), None) => break (ri, comparison.len()),
            (None, Some((ci, _))) => break (reference.len(), ci),
            (None, None) => break (reference.len(), comparison.len()),
        }
    };

    let overlap = position;
    let reference_rest = &reference[ref_tail..];
    let comparison_rest = &comparison[comp_tail..];
    if !comparison_rest.is_empty() {
        mutations.push(Mutation::insertion(overlap, comparison_rest));
    } else if !reference_rest.is_empty() {
        mutations.push(Mutation::deletion(overlap, reference_rest));
    }

    let reference_len = overlap + reference_rest.chars().count();
    let comparison_len = overlap + comparison_rest.chars().count();
    log::debug!(
        "Comparing {} vs {} positions took {:?}",
        reference_len,
        comparison_len,
        start.elapsed()
    );

    VariationReport {
        mutations,
        reference_len,
        comparison_len,
    }
}
