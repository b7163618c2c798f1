//! In-memory directory, seed data and stub models used by unit and behaviour
//! tests.

use std::collections::HashMap;

use geo::Coord;
use thiserror::Error;

use crate::{
    AggregateTables, Availability, DirectoryError, FEATURE_COUNT, FeatureName, InlineCandidate,
    InlinePayload, InlineRequest, ModelError, NormalizedVector, PriceAggregate, RankingModel,
    RatingAggregate, ScoringContext, ServiceRequest, StandardScaler, Technician,
    TechnicianDirectory,
};

/// Raised by a [`MemoryDirectory`] configured to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("injected failure in `{operation}`")]
pub struct InjectedFailure {
    /// Lookup that was told to fail.
    pub operation: &'static str,
}

/// Raw rows describing a directory, shared by the in-memory and SQLite
/// fixtures so both produce the same data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectorySeed {
    /// Service requests.
    pub requests: Vec<ServiceRequest>,
    /// Technicians, available or not.
    pub technicians: Vec<Technician>,
    /// `(technician_id, score)` rating rows.
    pub ratings: Vec<(u64, f64)>,
    /// `(technician_id, price)` offer rows.
    pub offers: Vec<(u64, Option<f64>)>,
    /// Technician identifiers, one per completed assignment.
    pub assignments: Vec<u64>,
}

impl DirectorySeed {
    /// Request identifier used by [`DirectorySeed::nearby_pair`].
    pub const REQUEST_ID: u64 = 7;

    /// A request at (10.0, -70.0) with three technicians:
    ///
    /// - `1`: on site, rating 5, two ratings, one offer, three assignments;
    /// - `2`: at (10.5, -70.5), rating 3, no history;
    /// - `3`: on site and highly rated but unavailable.
    #[must_use]
    pub fn nearby_pair() -> Self {
        let site = Coord { x: -70.0, y: 10.0 };
        Self {
            requests: vec![ServiceRequest::new(Self::REQUEST_ID, 3, 2, Some(site))],
            technicians: vec![
                Technician {
                    id: 1,
                    location: Some(site),
                    average_rating: Some(5.0),
                    available: true,
                },
                Technician {
                    id: 2,
                    location: Some(Coord { x: -70.5, y: 10.5 }),
                    average_rating: Some(3.0),
                    available: true,
                },
                Technician {
                    id: 3,
                    location: Some(site),
                    average_rating: Some(5.0),
                    available: false,
                },
            ],
            ratings: vec![(1, 4.0), (1, 5.0), (3, 5.0)],
            offers: vec![(1, Some(50.0)), (3, Some(10.0))],
            assignments: vec![1, 1, 1, 3],
        }
    }

    /// Express the seed as an inline payload for `request_id`.
    ///
    /// Only available technicians are included, with history pre-joined, so
    /// the payload describes exactly what a directory lookup would return.
    /// An unknown `request_id` yields a payload carrying only that id.
    #[must_use]
    pub fn inline_payload(&self, request_id: u64) -> InlinePayload {
        let request = self
            .requests
            .iter()
            .find(|r| r.id == request_id)
            .map_or_else(
                || InlineRequest {
                    id: Some(request_id),
                    ..InlineRequest::default()
                },
                |r| InlineRequest {
                    id: Some(r.id),
                    client_id: r.client_id,
                    category_id: r.category_id,
                    lat: r.location.map(|c| c.y),
                    lon: r.location.map(|c| c.x),
                },
            );
        let tables = self.aggregate_tables();
        let mut technicians: Vec<_> = self.technicians.iter().filter(|t| t.available).collect();
        technicians.sort_by_key(|t| t.id);
        let candidates = technicians
            .into_iter()
            .map(|t| InlineCandidate {
                technician_id: Some(t.id),
                lat: t.location.map(|c| c.y),
                lon: t.location.map(|c| c.x),
                rating: t.average_rating,
                available: Availability::Bool(t.available),
                history: tables.history_for(t.id),
            })
            .collect();
        InlinePayload {
            request,
            candidates,
        }
    }

    /// Group the raw rows the way the datastore aggregates do.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "averages divide a float sum by a small row count"
    )]
    pub fn aggregate_tables(&self) -> AggregateTables {
        let mut rating_rows: HashMap<u64, Vec<f64>> = HashMap::new();
        for &(id, score) in &self.ratings {
            rating_rows.entry(id).or_default().push(score);
        }
        let mut offer_rows: HashMap<u64, Vec<Option<f64>>> = HashMap::new();
        for &(id, price) in &self.offers {
            offer_rows.entry(id).or_default().push(price);
        }
        let mut completed: HashMap<u64, u64> = HashMap::new();
        for &id in &self.assignments {
            *completed.entry(id).or_default() += 1;
        }

        let mean = |values: &[f64]| {
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        };
        AggregateTables {
            ratings: rating_rows
                .into_iter()
                .map(|(id, scores)| {
                    let aggregate = RatingAggregate {
                        average: mean(&scores),
                        count: scores.len() as u64,
                    };
                    (id, aggregate)
                })
                .collect(),
            prices: offer_rows
                .into_iter()
                .map(|(id, prices)| {
                    let known: Vec<f64> = prices.iter().flatten().copied().collect();
                    let aggregate = PriceAggregate {
                        average_price: mean(&known),
                        offer_count: prices.len() as u64,
                    };
                    (id, aggregate)
                })
                .collect(),
            completed,
        }
    }
}

/// In-memory [`TechnicianDirectory`] used in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    requests: HashMap<u64, ServiceRequest>,
    technicians: Vec<Technician>,
    tables: AggregateTables,
    failing: Option<&'static str>,
}

impl MemoryDirectory {
    /// Build a directory from seed rows.
    #[must_use]
    pub fn from_seed(seed: &DirectorySeed) -> Self {
        Self {
            requests: seed.requests.iter().map(|r| (r.id, *r)).collect(),
            technicians: seed.technicians.clone(),
            tables: seed.aggregate_tables(),
            failing: None,
        }
    }

    /// Add a request.
    #[must_use]
    pub fn with_request(mut self, request: ServiceRequest) -> Self {
        self.requests.insert(request.id, request);
        self
    }

    /// Add a technician.
    #[must_use]
    pub fn with_technician(mut self, technician: Technician) -> Self {
        self.technicians.push(technician);
        self
    }

    /// Make the named lookup fail with [`InjectedFailure`].
    #[must_use]
    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.failing = Some(operation);
        self
    }

    fn check(&self, operation: &'static str) -> Result<(), DirectoryError> {
        match self.failing {
            Some(failing) if failing == operation => {
                Err(DirectoryError::lookup(operation, InjectedFailure { operation }))
            }
            _ => Ok(()),
        }
    }
}

impl TechnicianDirectory for MemoryDirectory {
    fn find_request(&self, id: u64) -> Result<Option<ServiceRequest>, DirectoryError> {
        self.check("find_request")?;
        Ok(self.requests.get(&id).copied())
    }

    fn available_technicians(&self) -> Result<Vec<Technician>, DirectoryError> {
        self.check("available_technicians")?;
        let mut available: Vec<_> = self
            .technicians
            .iter()
            .filter(|t| t.available)
            .copied()
            .collect();
        available.sort_by_key(|t| t.id);
        Ok(available)
    }

    fn rating_aggregates(&self) -> Result<HashMap<u64, RatingAggregate>, DirectoryError> {
        self.check("rating_aggregates")?;
        Ok(self.tables.ratings.clone())
    }

    fn price_aggregates(&self) -> Result<HashMap<u64, PriceAggregate>, DirectoryError> {
        self.check("price_aggregates")?;
        Ok(self.tables.prices.clone())
    }

    fn completed_services(&self) -> Result<HashMap<u64, u64>, DirectoryError> {
        self.check("completed_services")?;
        Ok(self.tables.completed.clone())
    }
}

/// Persist seed rows to a fresh SQLite database at `path`.
///
/// # Errors
/// Returns any `rusqlite` error raised while creating the schema or
/// inserting rows.
#[cfg(feature = "store-sqlite")]
pub fn write_sqlite_directory(
    path: &std::path::Path,
    seed: &DirectorySeed,
) -> rusqlite::Result<()> {
    use rusqlite::{Connection, params};

    let mut connection = Connection::open(path)?;
    connection.execute_batch(
        "CREATE TABLE service_requests (
            id INTEGER PRIMARY KEY,
            client_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            lat REAL,
            lon REAL
        );
        CREATE TABLE technicians (
            id INTEGER PRIMARY KEY,
            average_rating REAL,
            available INTEGER NOT NULL
        );
        CREATE TABLE technician_locations (
            technician_id INTEGER NOT NULL,
            lat REAL NOT NULL,
            lon REAL NOT NULL
        );
        CREATE TABLE ratings (technician_id INTEGER NOT NULL, score REAL NOT NULL);
        CREATE TABLE technician_offers (technician_id INTEGER NOT NULL, price REAL);
        CREATE TABLE service_assignments (technician_id INTEGER NOT NULL);",
    )?;

    let tx = connection.transaction()?;
    for request in &seed.requests {
        tx.execute(
            "INSERT INTO service_requests (id, client_id, category_id, lat, lon)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                request.id,
                request.client_id,
                request.category_id,
                request.location.map(|c| c.y),
                request.location.map(|c| c.x),
            ],
        )?;
    }
    for technician in &seed.technicians {
        tx.execute(
            "INSERT INTO technicians (id, average_rating, available) VALUES (?1, ?2, ?3)",
            params![technician.id, technician.average_rating, technician.available],
        )?;
        if let Some(location) = technician.location {
            tx.execute(
                "INSERT INTO technician_locations (technician_id, lat, lon) VALUES (?1, ?2, ?3)",
                params![technician.id, location.y, location.x],
            )?;
        }
    }
    for (id, score) in &seed.ratings {
        tx.execute(
            "INSERT INTO ratings (technician_id, score) VALUES (?1, ?2)",
            params![id, score],
        )?;
    }
    for (id, price) in &seed.offers {
        tx.execute(
            "INSERT INTO technician_offers (technician_id, price) VALUES (?1, ?2)",
            params![id, price],
        )?;
    }
    for id in &seed.assignments {
        tx.execute(
            "INSERT INTO service_assignments (technician_id) VALUES (?1)",
            params![id],
        )?;
    }
    tx.commit()
}

/// Linear stub scorer: `intercept + Σ wᵢ·xᵢ` over normalised inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearStubModel {
    weights: [f64; FEATURE_COUNT],
    intercept: f64,
}

impl LinearStubModel {
    /// Build a stub from explicit weights.
    #[must_use]
    pub const fn new(weights: [f64; FEATURE_COUNT], intercept: f64) -> Self {
        Self { weights, intercept }
    }

    /// Scores fall with distance and rise with static rating.
    #[must_use]
    pub fn distance_and_rating() -> Self {
        let mut weights = [0.0; FEATURE_COUNT];
        for (feature, weight) in FeatureName::ALL.into_iter().zip(&mut weights) {
            *weight = match feature {
                FeatureName::DistanceKm => -1.0,
                FeatureName::StaticRating => 1.0,
                _ => 0.0,
            };
        }
        Self::new(weights, 0.0)
    }
}

impl RankingModel for LinearStubModel {
    fn score(&self, batch: &[NormalizedVector]) -> Result<Vec<f64>, ModelError> {
        Self::check_input(batch)?;
        Ok(batch
            .iter()
            .map(|vector| {
                vector
                    .values()
                    .iter()
                    .zip(&self.weights)
                    .fold(self.intercept, |acc, (x, w)| x.mul_add(*w, acc))
            })
            .collect())
    }
}

/// Stub scorer returning the same score for every input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantModel(pub f64);

impl RankingModel for ConstantModel {
    fn score(&self, batch: &[NormalizedVector]) -> Result<Vec<f64>, ModelError> {
        Ok(vec![self.0; batch.len()])
    }
}

/// Stub scorer that drops the last score, for exercising output checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortOutputModel;

impl RankingModel for ShortOutputModel {
    fn score(&self, batch: &[NormalizedVector]) -> Result<Vec<f64>, ModelError> {
        Ok(vec![0.0; batch.len().saturating_sub(1)])
    }
}

/// A context holding the identity scaler and
/// [`LinearStubModel::distance_and_rating`].
#[must_use]
pub fn ready_context() -> ScoringContext {
    ScoringContext::ready(
        StandardScaler::identity(),
        LinearStubModel::distance_and_rating(),
    )
}
