//! Pre-joined request and candidate data supplied inline by the caller.
//!
//! An inline payload skips every datastore lookup. Fields are loosely typed
//! on the wire and validated by [`InlinePayload::into_parts`], which produces
//! the same [`ServiceRequest`] and [`CandidateRecord`] values the datastore
//! path builds. Validation failures name the offending field, for example
//! `candidates[2].technician_id`.
//!
//! ```json
//! {
//!   "request": { "id": 7, "client_id": 3, "category_id": 2, "lat": 10.0, "lon": -70.0 },
//!   "candidates": [
//!     { "technician_id": 1, "lat": 10.0, "lon": -70.0, "rating": 5.0, "available": 1,
//!       "history": { "rating_average": 4.8, "rating_count": 12 } }
//!   ]
//! }
//! ```

use geo::Coord;
use log::warn;
use thiserror::Error;

use crate::{CandidateRecord, HistoryMetrics, ServiceRequest};

/// Validation failures for an [`InlinePayload`].
#[derive(Debug, Error)]
pub enum PayloadError {
    /// A required field was absent.
    #[error("missing required field `{field}`")]
    MissingField {
        /// Path of the missing field.
        field: String,
    },
    /// Only one half of a coordinate pair was supplied.
    #[error("`{field}` must be given together with `{present}`")]
    PartialCoordinates {
        /// Path of the missing half.
        field: String,
        /// Path of the half that was supplied.
        present: String,
    },
    /// A coordinate lay outside its valid range.
    #[error("`{field}` is out of range (got {value})")]
    CoordinateOutOfRange {
        /// Path of the coordinate.
        field: String,
        /// Rejected value.
        value: f64,
    },
    /// A numeric value was NaN or infinite.
    #[error("`{field}` must be finite (got {value})")]
    NonFinite {
        /// Path of the value.
        field: String,
        /// Rejected value.
        value: f64,
    },
    /// An integer availability flag was neither 0 nor 1.
    #[error("`{field}` must be a boolean, 0 or 1 (got {value})")]
    InvalidAvailability {
        /// Path of the flag.
        field: String,
        /// Rejected value.
        value: i64,
    },
    /// The payload describes a different request.
    #[error("payload request id {found} does not match requested id {expected}")]
    RequestMismatch {
        /// Identifier the caller asked for.
        expected: u64,
        /// Identifier found in the payload.
        found: u64,
    },
    /// The payload was not valid JSON for this shape.
    #[cfg(feature = "serde")]
    #[error("malformed payload JSON")]
    Json {
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
}

/// Availability flag as accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Availability {
    /// `true` or `false`.
    Bool(bool),
    /// `1` or `0`.
    Int(i64),
}

impl Default for Availability {
    fn default() -> Self {
        Self::Bool(true)
    }
}

impl Availability {
    fn resolve(self, field: impl FnOnce() -> String) -> Result<bool, PayloadError> {
        match self {
            Self::Bool(flag) => Ok(flag),
            Self::Int(0) => Ok(false),
            Self::Int(1) => Ok(true),
            Self::Int(value) => Err(PayloadError::InvalidAvailability {
                field: field(),
                value,
            }),
        }
    }
}

/// Request section of an inline payload.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InlineRequest {
    /// Request identifier; required.
    pub id: Option<u64>,
    /// Client identifier.
    pub client_id: u64,
    /// Category identifier.
    pub category_id: u64,
    /// Latitude in degrees.
    pub lat: Option<f64>,
    /// Longitude in degrees.
    pub lon: Option<f64>,
}

/// One pre-joined candidate.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InlineCandidate {
    /// Technician identifier; required.
    pub technician_id: Option<u64>,
    /// Latitude in degrees.
    pub lat: Option<f64>,
    /// Longitude in degrees.
    pub lon: Option<f64>,
    /// Static profile rating.
    pub rating: Option<f64>,
    /// Availability; defaults to available.
    pub available: Availability,
    /// Aggregated history; absent metrics count as zero.
    pub history: HistoryMetrics,
}

/// Request plus candidates supplied by the caller.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InlinePayload {
    /// The request being served.
    pub request: InlineRequest,
    /// Technicians to score.
    #[cfg_attr(feature = "serde", serde(default))]
    pub candidates: Vec<InlineCandidate>,
}

impl InlinePayload {
    /// Parse a payload from JSON bytes.
    ///
    /// # Errors
    /// Returns [`PayloadError::Json`] when the bytes do not describe a
    /// payload.
    #[cfg(feature = "serde")]
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, PayloadError> {
        serde_json::from_slice(bytes).map_err(|source| PayloadError::Json { source })
    }

    /// Validate the payload and convert it into pipeline records.
    ///
    /// # Errors
    /// Returns [`PayloadError`] naming the first invalid field, or
    /// [`PayloadError::RequestMismatch`] when the payload describes a
    /// request other than `request_id`.
    ///
    /// # Examples
    /// ```
    /// use techmatch_core::{InlineCandidate, InlinePayload, InlineRequest};
    ///
    /// let payload = InlinePayload {
    ///     request: InlineRequest { id: Some(7), ..InlineRequest::default() },
    ///     candidates: vec![InlineCandidate { technician_id: Some(1), ..InlineCandidate::default() }],
    /// };
    /// let (request, candidates) = payload.into_parts(7).expect("valid payload");
    /// assert_eq!(request.location, None);
    /// assert!(candidates[0].available);
    /// ```
    pub fn into_parts(
        &self,
        request_id: u64,
    ) -> Result<(ServiceRequest, Vec<CandidateRecord>), PayloadError> {
        let request = self.request.validate()?;
        if request.id != request_id {
            return Err(PayloadError::RequestMismatch {
                expected: request_id,
                found: request.id,
            });
        }
        let candidates = self
            .candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| candidate.validate(index))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((request, candidates))
    }
}

impl InlineRequest {
    fn validate(&self) -> Result<ServiceRequest, PayloadError> {
        let id = self.id.ok_or_else(|| PayloadError::MissingField {
            field: "request.id".to_owned(),
        })?;
        let location = coordinates("request", self.lat, self.lon)?;
        Ok(ServiceRequest::new(
            id,
            self.client_id,
            self.category_id,
            location,
        ))
    }
}

impl InlineCandidate {
    fn validate(&self, index: usize) -> Result<CandidateRecord, PayloadError> {
        let prefix = format!("candidates[{index}]");
        let technician_id = self
            .technician_id
            .ok_or_else(|| PayloadError::MissingField {
                field: format!("{prefix}.technician_id"),
            })?;
        let location = coordinates(&prefix, self.lat, self.lon)?;
        let static_rating = finite(&prefix, "rating", self.rating)?;
        let available = self
            .available
            .resolve(|| format!("{prefix}.available"))?;
        if !available {
            warn!("inline candidate {technician_id} is flagged unavailable; scoring it anyway");
        }
        let history = HistoryMetrics {
            rating_average: finite(&prefix, "history.rating_average", self.history.rating_average)?,
            average_price: finite(&prefix, "history.average_price", self.history.average_price)?,
            ..self.history
        };
        Ok(CandidateRecord {
            technician_id,
            location,
            static_rating,
            available,
            history,
        })
    }
}

fn finite(prefix: &str, name: &str, value: Option<f64>) -> Result<Option<f64>, PayloadError> {
    match value {
        Some(v) if !v.is_finite() => Err(PayloadError::NonFinite {
            field: format!("{prefix}.{name}"),
            value: v,
        }),
        other => Ok(other),
    }
}

fn coordinates(
    prefix: &str,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<Option<Coord<f64>>, PayloadError> {
    let (lat_deg, lon_deg) = match (lat, lon) {
        (None, None) => return Ok(None),
        (Some(y), Some(x)) => (y, x),
        (Some(_), None) => {
            return Err(PayloadError::PartialCoordinates {
                field: format!("{prefix}.lon"),
                present: format!("{prefix}.lat"),
            });
        }
        (None, Some(_)) => {
            return Err(PayloadError::PartialCoordinates {
                field: format!("{prefix}.lat"),
                present: format!("{prefix}.lon"),
            });
        }
    };
    check_range(prefix, "lat", lat_deg, 90.0)?;
    check_range(prefix, "lon", lon_deg, 180.0)?;
    Ok(Some(Coord {
        x: lon_deg,
        y: lat_deg,
    }))
}

fn check_range(prefix: &str, name: &str, value: f64, limit: f64) -> Result<(), PayloadError> {
    if !value.is_finite() {
        return Err(PayloadError::NonFinite {
            field: format!("{prefix}.{name}"),
            value,
        });
    }
    if !(-limit..=limit).contains(&value) {
        return Err(PayloadError::CoordinateOutOfRange {
            field: format!("{prefix}.{name}"),
            value,
        });
    }
    Ok(())
}
