//! Order scored candidates.

use std::cmp::Ordering;

use crate::{CandidateRecord, FeatureVector};

/// A candidate with its features and model score.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScoredTechnician {
    /// Technician identifier.
    pub technician_id: u64,
    /// Candidate attributes as supplied to the pipeline.
    pub candidate: CandidateRecord,
    /// Raw (unnormalised) features in model order.
    pub features: FeatureVector,
    /// Model score; higher ranks earlier.
    pub score: f64,
}

/// Sort by score, best first.
///
/// The sort is stable: candidates with equal scores keep their input order.
/// Nothing is truncated.
///
/// # Examples
/// ```
/// use techmatch_core::{CandidateRecord, FeatureVector, HistoryMetrics, ScoredTechnician, rank};
///
/// let scored = |id: u64, score: f64| ScoredTechnician {
///     technician_id: id,
///     candidate: CandidateRecord {
///         technician_id: id,
///         location: None,
///         static_rating: None,
///         available: true,
///         history: HistoryMetrics::default(),
///     },
///     features: FeatureVector::new([0.0; 8]),
///     score,
/// };
/// let ranked = rank(vec![scored(1, 0.2), scored(2, 0.9), scored(3, 0.2)]);
/// let ids: Vec<u64> = ranked.iter().map(|s| s.technician_id).collect();
/// assert_eq!(ids, vec![2, 1, 3]);
/// ```
#[must_use]
pub fn rank(mut scored: Vec<ScoredTechnician>) -> Vec<ScoredTechnician> {
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HistoryMetrics;
    use proptest::prelude::*;
    use rstest::rstest;

    fn scored(technician_id: u64, score: f64) -> ScoredTechnician {
        ScoredTechnician {
            technician_id,
            candidate: CandidateRecord {
                technician_id,
                location: None,
                static_rating: None,
                available: true,
                history: HistoryMetrics::default(),
            },
            features: FeatureVector::new([0.0; 8]),
            score,
        }
    }

    fn ids(ranked: &[ScoredTechnician]) -> Vec<u64> {
        ranked.iter().map(|s| s.technician_id).collect()
    }

    #[rstest]
    fn sorts_descending() {
        let ranked = rank(vec![scored(1, -1.0), scored(2, 3.0), scored(3, 0.5)]);
        assert_eq!(ids(&ranked), vec![2, 3, 1]);
    }

    #[rstest]
    fn ties_keep_input_order() {
        let ranked = rank(vec![
            scored(5, 1.0),
            scored(4, 2.0),
            scored(3, 1.0),
            scored(2, 2.0),
        ]);
        assert_eq!(ids(&ranked), vec![4, 2, 5, 3]);
    }

    #[rstest]
    fn empty_input_is_empty() {
        assert!(rank(Vec::new()).is_empty());
    }

    proptest! {
        #[test]
        fn output_is_non_increasing_and_stable(
            scores in proptest::collection::vec(-3_i8..3, 0..64),
        ) {
            let input: Vec<_> = scores
                .iter()
                .zip(0_u64..)
                .map(|(&score, id)| scored(id, f64::from(score)))
                .collect();

            let ranked = rank(input.clone());

            prop_assert_eq!(ranked.len(), input.len());
            for pair in ranked.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(a.score >= b.score);
                if a.score == b.score {
                    prop_assert!(a.technician_id < b.technician_id, "tie order changed");
                }
            }
        }
    }
}
