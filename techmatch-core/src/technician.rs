//! Technician records and their aggregated service history.
//!
//! Candidates reach the feature pipeline as [`CandidateRecord`]s regardless
//! of where they came from. Datastore rows are joined with
//! [`AggregateTables`] via [`AggregateTables::attach`]; inline payloads are
//! converted in [`crate::payload`].

use std::collections::HashMap;

use geo::Coord;

/// Static attributes of a technician as stored in the directory.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Technician {
    /// Technician identifier.
    pub id: u64,
    /// Last known position, if the technician has reported one.
    pub location: Option<Coord<f64>>,
    /// Average rating stored on the technician profile.
    pub average_rating: Option<f64>,
    /// Whether the technician currently accepts work.
    pub available: bool,
}

/// Historical metrics attached to a candidate.
///
/// `None` marks a metric with no recorded history; assembly treats it as
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HistoryMetrics {
    /// Mean of all ratings received.
    pub rating_average: Option<f64>,
    /// Number of ratings received.
    pub rating_count: Option<u64>,
    /// Mean price quoted across offers.
    pub average_price: Option<f64>,
    /// Number of offers made.
    pub offer_count: Option<u64>,
    /// Number of assignments completed.
    pub completed_services: Option<u64>,
}

/// A technician considered for a request, with history attached.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use techmatch_core::{CandidateRecord, HistoryMetrics};
///
/// let candidate = CandidateRecord {
///     technician_id: 4,
///     location: Some(Coord { x: -70.0, y: 10.0 }),
///     static_rating: Some(4.5),
///     available: true,
///     history: HistoryMetrics::default(),
/// };
/// assert_eq!(candidate.history.rating_count, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateRecord {
    /// Technician identifier.
    pub technician_id: u64,
    /// Technician position, if known.
    pub location: Option<Coord<f64>>,
    /// Static profile rating.
    pub static_rating: Option<f64>,
    /// Availability flag.
    pub available: bool,
    /// Aggregated history.
    pub history: HistoryMetrics,
}

impl From<Technician> for CandidateRecord {
    fn from(technician: Technician) -> Self {
        Self {
            technician_id: technician.id,
            location: technician.location,
            static_rating: technician.average_rating,
            available: technician.available,
            history: HistoryMetrics::default(),
        }
    }
}

/// Rating history for one technician.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RatingAggregate {
    /// Mean rating; `None` when the datastore reports a null average.
    pub average: Option<f64>,
    /// Number of ratings.
    pub count: u64,
}

/// Offer history for one technician.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceAggregate {
    /// Mean offered price; `None` when every recorded price is null.
    pub average_price: Option<f64>,
    /// Number of offers.
    pub offer_count: u64,
}

/// Aggregate lookups keyed by technician identifier.
///
/// Technicians absent from a table receive `None` for the affected metrics.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use techmatch_core::{AggregateTables, RatingAggregate, Technician};
///
/// let tables = AggregateTables {
///     ratings: HashMap::from([(1, RatingAggregate { average: Some(4.0), count: 3 })]),
///     ..AggregateTables::default()
/// };
/// let technician = Technician { id: 1, location: None, average_rating: None, available: true };
/// let candidate = tables.attach(technician);
/// assert_eq!(candidate.history.rating_count, Some(3));
/// assert_eq!(candidate.history.offer_count, None);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateTables {
    /// Rating history per technician.
    pub ratings: HashMap<u64, RatingAggregate>,
    /// Offer history per technician.
    pub prices: HashMap<u64, PriceAggregate>,
    /// Completed assignment counts per technician.
    pub completed: HashMap<u64, u64>,
}

impl AggregateTables {
    /// Look up the history for a technician.
    #[must_use]
    pub fn history_for(&self, technician_id: u64) -> HistoryMetrics {
        let rating = self.ratings.get(&technician_id);
        let price = self.prices.get(&technician_id);
        HistoryMetrics {
            rating_average: rating.and_then(|r| r.average),
            rating_count: rating.map(|r| r.count),
            average_price: price.and_then(|p| p.average_price),
            offer_count: price.map(|p| p.offer_count),
            completed_services: self.completed.get(&technician_id).copied(),
        }
    }

    /// Join a technician with its history.
    #[must_use]
    pub fn attach(&self, technician: Technician) -> CandidateRecord {
        CandidateRecord {
            history: self.history_for(technician.id),
            ..CandidateRecord::from(technician)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tables() -> AggregateTables {
        AggregateTables {
            ratings: HashMap::from([(
                1,
                RatingAggregate {
                    average: Some(4.5),
                    count: 2,
                },
            )]),
            prices: HashMap::from([(
                2,
                PriceAggregate {
                    average_price: None,
                    offer_count: 5,
                },
            )]),
            completed: HashMap::from([(1, 9)]),
        }
    }

    #[rstest]
    fn attaches_all_known_metrics(tables: AggregateTables) {
        let history = tables.history_for(1);
        assert_eq!(history.rating_average, Some(4.5));
        assert_eq!(history.rating_count, Some(2));
        assert_eq!(history.completed_services, Some(9));
        assert_eq!(history.average_price, None);
        assert_eq!(history.offer_count, None);
    }

    #[rstest]
    fn null_average_keeps_count(tables: AggregateTables) {
        let history = tables.history_for(2);
        assert_eq!(history.average_price, None);
        assert_eq!(history.offer_count, Some(5));
    }

    #[rstest]
    fn unknown_technician_has_empty_history(tables: AggregateTables) {
        assert_eq!(tables.history_for(42), HistoryMetrics::default());
    }

    #[rstest]
    fn attach_preserves_static_attributes(tables: AggregateTables) {
        let technician = Technician {
            id: 1,
            location: Some(Coord { x: 1.0, y: 2.0 }),
            average_rating: Some(3.5),
            available: true,
        };

        let candidate = tables.attach(technician);

        assert_eq!(candidate.technician_id, 1);
        assert_eq!(candidate.location, technician.location);
        assert_eq!(candidate.static_rating, Some(3.5));
        assert!(candidate.available);
        assert_eq!(candidate.history.rating_count, Some(2));
    }
}
