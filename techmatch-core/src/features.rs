//! Feature assembly for request/technician pairs.
//!
//! Every pair is described by [`FEATURE_COUNT`] scalars in the order given by
//! [`FeatureName::ALL`]. The normaliser and the ranking model are both
//! positional, so this order is part of the model contract.

use std::{collections::BTreeMap, fmt};

use geo::Coord;
use thiserror::Error;

use crate::{CandidateRecord, ServiceRequest, UNKNOWN_DISTANCE_KM, haversine_km_many};

/// Number of features per request/technician pair.
pub const FEATURE_COUNT: usize = 8;

/// Named model inputs, declared in model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FeatureName {
    /// Great-circle distance in kilometres, or the unknown-distance penalty.
    DistanceKm,
    /// Rating stored on the technician profile.
    StaticRating,
    /// Mean of historical ratings.
    HistoricalRating,
    /// Number of historical ratings.
    RatingCount,
    /// Mean historical offer price.
    AveragePrice,
    /// Number of historical offers.
    OfferCount,
    /// Number of completed assignments.
    CompletedServices,
    /// `1.0` when available, else `0.0`.
    Availability,
}

impl FeatureName {
    /// All features in model order.
    pub const ALL: [Self; FEATURE_COUNT] = [
        Self::DistanceKm,
        Self::StaticRating,
        Self::HistoricalRating,
        Self::RatingCount,
        Self::AveragePrice,
        Self::OfferCount,
        Self::CompletedServices,
        Self::Availability,
    ];

    /// Column name used in artefacts and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DistanceKm => "distance_km",
            Self::StaticRating => "static_rating",
            Self::HistoricalRating => "historical_rating",
            Self::RatingCount => "rating_count",
            Self::AveragePrice => "average_price",
            Self::OfferCount => "offer_count",
            Self::CompletedServices => "completed_services",
            Self::Availability => "availability",
        }
    }

    /// Position of the feature inside a [`FeatureVector`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Resolve a column name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.as_str() == name)
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of model input in [`FeatureName::ALL`] order.
///
/// # Examples
/// ```
/// use techmatch_core::{FeatureName, FeatureVector};
///
/// let vector = FeatureVector::new([1.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
/// assert_eq!(vector.get(FeatureName::StaticRating), 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wrap raw values given in model order.
    #[must_use]
    pub const fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Read a single feature.
    #[must_use]
    #[expect(
        clippy::indexing_slicing,
        reason = "FeatureName::index is always below FEATURE_COUNT"
    )]
    pub const fn get(&self, feature: FeatureName) -> f64 {
        self.0[feature.index()]
    }

    /// Borrow the values in model order.
    #[must_use]
    pub const fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// Iterate over `(name, value)` pairs in model order.
    pub fn named(&self) -> impl Iterator<Item = (FeatureName, f64)> + '_ {
        FeatureName::ALL.into_iter().zip(self.0.iter().copied())
    }
}

/// Structural problems found while validating a [`FeatureTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    /// Required feature columns are absent.
    #[error("feature table is missing columns: {}", join_names(.columns))]
    MissingColumns {
        /// Missing columns in model order.
        columns: Vec<FeatureName>,
    },
    /// A column holds a different number of values than there are rows.
    #[error("feature column {column} has {found} values, expected {expected}")]
    ColumnLength {
        /// Offending column.
        column: FeatureName,
        /// Number of technicians in the table.
        expected: usize,
        /// Number of values in the column.
        found: usize,
    },
}

fn join_names(columns: &[FeatureName]) -> String {
    columns
        .iter()
        .map(|column| column.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Columnar feature table for a batch of candidates.
///
/// Rows keep the order in which candidates were supplied; that order is the
/// tie-break order used by [`crate::rank`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    technician_ids: Vec<u64>,
    columns: BTreeMap<FeatureName, Vec<f64>>,
}

impl FeatureTable {
    /// Build a table from precomputed columns.
    ///
    /// Columns are validated lazily by [`FeatureTable::into_vectors`].
    #[must_use]
    pub const fn from_columns(
        technician_ids: Vec<u64>,
        columns: BTreeMap<FeatureName, Vec<f64>>,
    ) -> Self {
        Self {
            technician_ids,
            columns,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.technician_ids.len()
    }

    /// Report whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.technician_ids.is_empty()
    }

    /// Technician identifiers in row order.
    #[must_use]
    pub fn technician_ids(&self) -> &[u64] {
        &self.technician_ids
    }

    /// Borrow one column, if present.
    #[must_use]
    pub fn column(&self, feature: FeatureName) -> Option<&[f64]> {
        self.columns.get(&feature).map(Vec::as_slice)
    }

    /// Required columns that are absent, in model order.
    #[must_use]
    pub fn missing_columns(&self) -> Vec<FeatureName> {
        FeatureName::ALL
            .into_iter()
            .filter(|feature| !self.columns.contains_key(feature))
            .collect()
    }

    /// Validate the table and convert it into row vectors.
    ///
    /// # Errors
    /// Returns [`FeatureError::MissingColumns`] naming every absent column,
    /// or [`FeatureError::ColumnLength`] when a column is ragged.
    pub fn into_vectors(self) -> Result<Vec<FeatureVector>, FeatureError> {
        let missing = self.missing_columns();
        if !missing.is_empty() {
            return Err(FeatureError::MissingColumns { columns: missing });
        }
        let rows = self.len();
        let mut vectors = vec![[0.0_f64; FEATURE_COUNT]; rows];
        for (feature, values) in &self.columns {
            if values.len() != rows {
                return Err(FeatureError::ColumnLength {
                    column: *feature,
                    expected: rows,
                    found: values.len(),
                });
            }
            for (row, &value) in vectors.iter_mut().zip(values) {
                if let Some(slot) = row.get_mut(feature.index()) {
                    *slot = value;
                }
            }
        }
        Ok(vectors.into_iter().map(FeatureVector::new).collect())
    }
}

/// Assemble the feature table for a request and its candidates.
///
/// Unknown coordinates on either side yield the
/// [`UNKNOWN_DISTANCE_KM`](crate::UNKNOWN_DISTANCE_KM) penalty; missing
/// history metrics become zero.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use techmatch_core::{
///     CandidateRecord, FeatureName, HistoryMetrics, ServiceRequest, assemble,
/// };
///
/// let request = ServiceRequest::new(1, 1, 1, Some(Coord { x: -70.0, y: 10.0 }));
/// let candidate = CandidateRecord {
///     technician_id: 9,
///     location: None,
///     static_rating: Some(4.0),
///     available: true,
///     history: HistoryMetrics::default(),
/// };
/// let table = assemble(&request, &[candidate]);
/// assert_eq!(table.column(FeatureName::DistanceKm), Some(&[9999.0][..]));
/// ```
#[must_use]
pub fn assemble(request: &ServiceRequest, candidates: &[CandidateRecord]) -> FeatureTable {
    let technician_ids = candidates.iter().map(|c| c.technician_id).collect();
    let distances = distance_column(request.location, candidates);
    let columns = FeatureName::ALL
        .into_iter()
        .map(|feature| {
            let values = candidates
                .iter()
                .zip(&distances)
                .map(|(candidate, &distance)| feature_value(feature, candidate, distance))
                .collect();
            (feature, values)
        })
        .collect();
    FeatureTable {
        technician_ids,
        columns,
    }
}

/// Distances from `origin` to every candidate in one batch; candidates
/// without coordinates, or a missing origin, get the penalty.
fn distance_column(origin: Option<Coord<f64>>, candidates: &[CandidateRecord]) -> Vec<f64> {
    let Some(origin) = origin else {
        return vec![UNKNOWN_DISTANCE_KM; candidates.len()];
    };
    let known: Vec<Coord<f64>> = candidates.iter().filter_map(|c| c.location).collect();
    let mut measured = haversine_km_many(origin, &known).into_iter();
    candidates
        .iter()
        .map(|candidate| match candidate.location {
            Some(_) => measured.next().unwrap_or(UNKNOWN_DISTANCE_KM),
            None => UNKNOWN_DISTANCE_KM,
        })
        .collect()
}

#[expect(
    clippy::cast_precision_loss,
    reason = "history counts stay far below 2^52"
)]
fn feature_value(feature: FeatureName, candidate: &CandidateRecord, distance: f64) -> f64 {
    let history = &candidate.history;
    match feature {
        FeatureName::DistanceKm => distance,
        FeatureName::StaticRating => candidate.static_rating.unwrap_or(0.0),
        FeatureName::HistoricalRating => history.rating_average.unwrap_or(0.0),
        FeatureName::RatingCount => history.rating_count.unwrap_or(0) as f64,
        FeatureName::AveragePrice => history.average_price.unwrap_or(0.0),
        FeatureName::OfferCount => history.offer_count.unwrap_or(0) as f64,
        FeatureName::CompletedServices => history.completed_services.unwrap_or(0) as f64,
        FeatureName::Availability => f64::from(u8::from(candidate.available)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HistoryMetrics, distance_km};
    use rstest::{fixture, rstest};

    #[fixture]
    fn request() -> ServiceRequest {
        ServiceRequest::new(1, 10, 3, Some(Coord { x: -70.0, y: 10.0 }))
    }

    fn candidate(id: u64, location: Option<Coord<f64>>) -> CandidateRecord {
        CandidateRecord {
            technician_id: id,
            location,
            static_rating: Some(4.0),
            available: true,
            history: HistoryMetrics::default(),
        }
    }

    #[rstest]
    fn names_follow_model_order() {
        let names: Vec<_> = FeatureName::ALL.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names,
            [
                "distance_km",
                "static_rating",
                "historical_rating",
                "rating_count",
                "average_price",
                "offer_count",
                "completed_services",
                "availability",
            ]
        );
        for (position, feature) in FeatureName::ALL.into_iter().enumerate() {
            assert_eq!(feature.index(), position);
            assert_eq!(FeatureName::from_name(feature.as_str()), Some(feature));
        }
    }

    #[rstest]
    fn assembles_full_history(request: ServiceRequest) {
        let record = CandidateRecord {
            history: HistoryMetrics {
                rating_average: Some(4.5),
                rating_count: Some(12),
                average_price: Some(80.0),
                offer_count: Some(30),
                completed_services: Some(7),
            },
            ..candidate(5, request.location)
        };

        let vectors = assemble(&request, &[record])
            .into_vectors()
            .expect("complete table");

        assert_eq!(
            vectors,
            vec![FeatureVector::new([0.0, 4.0, 4.5, 12.0, 80.0, 30.0, 7.0, 1.0])]
        );
    }

    #[rstest]
    fn missing_history_defaults_to_zero(request: ServiceRequest) {
        let record = CandidateRecord {
            static_rating: None,
            available: false,
            ..candidate(5, request.location)
        };

        let vectors = assemble(&request, &[record])
            .into_vectors()
            .expect("complete table");

        assert_eq!(vectors, vec![FeatureVector::new([0.0; FEATURE_COUNT])]);
    }

    #[rstest]
    fn unknown_locations_use_penalty(request: ServiceRequest) {
        let no_request_location = ServiceRequest {
            location: None,
            ..request
        };
        let table = assemble(&request, &[candidate(1, None)]);
        let other = assemble(&no_request_location, &[candidate(2, request.location)]);

        let penalty = Some(&[UNKNOWN_DISTANCE_KM][..]);
        assert_eq!(table.column(FeatureName::DistanceKm), penalty);
        assert_eq!(other.column(FeatureName::DistanceKm), penalty);
    }

    #[rstest]
    fn batched_distances_match_pairwise(request: ServiceRequest) {
        let candidates = [
            candidate(1, Some(Coord { x: -70.5, y: 10.2 })),
            candidate(2, None),
            candidate(3, Some(Coord { x: -69.0, y: 9.0 })),
            candidate(4, None),
            candidate(5, request.location),
        ];

        let table = assemble(&request, &candidates);

        let expected: Vec<f64> = candidates
            .iter()
            .map(|c| distance_km(request.location, c.location).or_penalty())
            .collect();
        assert_eq!(
            table.column(FeatureName::DistanceKm),
            Some(expected.as_slice())
        );
        assert_eq!(expected[1], UNKNOWN_DISTANCE_KM);
        assert_eq!(expected[4], 0.0);
    }

    #[rstest]
    fn named_values_follow_model_order(request: ServiceRequest) {
        let vectors = assemble(&request, &[candidate(1, request.location)])
            .into_vectors()
            .expect("complete table");
        let vector = vectors.first().expect("one row");

        let named: Vec<_> = vector.named().collect();

        assert_eq!(named.len(), FEATURE_COUNT);
        assert_eq!(named[0], (FeatureName::DistanceKm, 0.0));
        assert_eq!(named[1], (FeatureName::StaticRating, 4.0));
        assert_eq!(named[7], (FeatureName::Availability, 1.0));
        for (feature, value) in named {
            assert_eq!(vector.get(feature), value);
        }
    }

    #[rstest]
    fn rows_keep_candidate_order(request: ServiceRequest) {
        let table = assemble(
            &request,
            &[candidate(3, None), candidate(1, None), candidate(2, None)],
        );
        assert_eq!(table.technician_ids(), &[3, 1, 2]);
    }

    #[rstest]
    fn no_candidates_yield_empty_vectors(request: ServiceRequest) {
        let table = assemble(&request, &[]);
        assert!(table.is_empty());
        assert!(table.into_vectors().expect("empty table is valid").is_empty());
    }

    #[rstest]
    fn reports_every_missing_column() {
        let columns = BTreeMap::from([
            (FeatureName::DistanceKm, vec![1.0]),
            (FeatureName::StaticRating, vec![4.0]),
            (FeatureName::HistoricalRating, vec![4.0]),
            (FeatureName::RatingCount, vec![2.0]),
            (FeatureName::OfferCount, vec![2.0]),
            (FeatureName::CompletedServices, vec![1.0]),
        ]);
        let table = FeatureTable::from_columns(vec![1], columns);

        let err = table.into_vectors().expect_err("columns are missing");

        assert_eq!(
            err,
            FeatureError::MissingColumns {
                columns: vec![FeatureName::AveragePrice, FeatureName::Availability],
            }
        );
        assert_eq!(
            err.to_string(),
            "feature table is missing columns: average_price, availability"
        );
    }

    #[rstest]
    fn rejects_ragged_columns() {
        let mut columns: BTreeMap<_, _> = FeatureName::ALL
            .into_iter()
            .map(|feature| (feature, vec![0.0, 0.0]))
            .collect();
        columns.insert(FeatureName::OfferCount, vec![0.0]);
        let table = FeatureTable::from_columns(vec![1, 2], columns);

        let err = table.into_vectors().expect_err("ragged column");

        assert_eq!(
            err,
            FeatureError::ColumnLength {
                column: FeatureName::OfferCount,
                expected: 2,
                found: 1,
            }
        );
    }
}
