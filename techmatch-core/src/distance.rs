//! Great-circle distances between request and technician locations.
//!
//! Coordinates follow the `geo` convention: `x = longitude`, `y = latitude`,
//! both in degrees. Distances use the haversine formula on a sphere of radius
//! [`EARTH_RADIUS_KM`].

use geo::Coord;
use thiserror::Error;

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance substituted when either endpoint has no coordinates.
pub const UNKNOWN_DISTANCE_KM: f64 = 9999.0;

/// Outcome of measuring between two optional locations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distance {
    /// Both endpoints were known.
    Known(f64),
    /// At least one endpoint had no coordinates.
    Unknown,
}

impl Distance {
    /// Return the measured distance or [`UNKNOWN_DISTANCE_KM`].
    ///
    /// # Examples
    /// ```
    /// use techmatch_core::{Distance, UNKNOWN_DISTANCE_KM};
    ///
    /// assert_eq!(Distance::Known(0.0).or_penalty(), 0.0);
    /// assert_eq!(Distance::Unknown.or_penalty(), UNKNOWN_DISTANCE_KM);
    /// ```
    #[must_use]
    pub const fn or_penalty(self) -> f64 {
        match self {
            Self::Known(km) => km,
            Self::Unknown => UNKNOWN_DISTANCE_KM,
        }
    }

    /// Return the measured distance, if any.
    #[must_use]
    pub const fn known(self) -> Option<f64> {
        match self {
            Self::Known(km) => Some(km),
            Self::Unknown => None,
        }
    }
}

/// Errors raised by the batch distance helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DistanceError {
    /// Origin and destination slices differ in length.
    #[error("cannot pair {origins} origins with {destinations} destinations")]
    LengthMismatch {
        /// Number of origins supplied.
        origins: usize,
        /// Number of destinations supplied.
        destinations: usize,
    },
}

/// Measure between two optional locations.
///
/// Returns [`Distance::Unknown`] when either side is `None`. A location at
/// `(0, 0)` is a real place and is measured normally.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use techmatch_core::{Distance, distance_km};
///
/// let here = Some(Coord { x: -70.0, y: 10.0 });
/// assert_eq!(distance_km(here, here), Distance::Known(0.0));
/// assert_eq!(distance_km(here, None), Distance::Unknown);
/// ```
#[must_use]
pub fn distance_km(from: Option<Coord<f64>>, to: Option<Coord<f64>>) -> Distance {
    match (from, to) {
        (Some(from), Some(to)) => Distance::Known(haversine_km(from, to)),
        _ => Distance::Unknown,
    }
}

/// Haversine distance between two coordinates in kilometres.
#[must_use]
pub fn haversine_km(from: Coord<f64>, to: Coord<f64>) -> f64 {
    Origin::new(from).distance_to(to)
}

/// Distances from one origin to many destinations.
///
/// The origin's trigonometry is computed once; results are bit-identical to
/// calling [`haversine_km`] per destination.
#[must_use]
pub fn haversine_km_many(origin: Coord<f64>, destinations: &[Coord<f64>]) -> Vec<f64> {
    let origin = Origin::new(origin);
    destinations
        .iter()
        .map(|&destination| origin.distance_to(destination))
        .collect()
}

/// Pairwise distances between equally sized slices.
///
/// # Errors
/// Returns [`DistanceError::LengthMismatch`] when the slices differ in
/// length.
pub fn haversine_km_pairs(
    origins: &[Coord<f64>],
    destinations: &[Coord<f64>],
) -> Result<Vec<f64>, DistanceError> {
    if origins.len() != destinations.len() {
        return Err(DistanceError::LengthMismatch {
            origins: origins.len(),
            destinations: destinations.len(),
        });
    }
    Ok(origins
        .iter()
        .zip(destinations)
        .map(|(&from, &to)| haversine_km(from, to))
        .collect())
}

/// Pre-computed terms for one endpoint.
#[derive(Debug, Clone, Copy)]
struct Origin {
    lat_rad: f64,
    lon_rad: f64,
    cos_lat: f64,
}

impl Origin {
    fn new(coord: Coord<f64>) -> Self {
        let lat_rad = coord.y.to_radians();
        Self {
            lat_rad,
            lon_rad: coord.x.to_radians(),
            cos_lat: lat_rad.cos(),
        }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "the haversine formula is floating-point trigonometry"
    )]
    fn distance_to(self, to: Coord<f64>) -> f64 {
        let lat_rad = to.y.to_radians();
        let d_lat = lat_rad - self.lat_rad;
        let d_lon = to.x.to_radians() - self.lon_rad;
        let a = (d_lat / 2.0).sin().powi(2)
            + self.cos_lat * lat_rad.cos() * (d_lon / 2.0).sin().powi(2);
        // Rounding can push `a` a hair above one for antipodal points.
        let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();
        EARTH_RADIUS_KM * c
    }
}
