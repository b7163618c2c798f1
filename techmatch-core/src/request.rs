//! Service requests awaiting a technician.

use geo::Coord;

/// A customer's request for a service visit.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`. The
/// location is `None` when the request carries no coordinates at all, which
/// is distinct from a request pinned at `(0, 0)`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use techmatch_core::ServiceRequest;
///
/// let request = ServiceRequest::new(7, 3, 2, Some(Coord { x: -70.0, y: 10.0 }));
/// assert_eq!(request.id, 7);
/// assert!(request.location.is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceRequest {
    /// Request identifier.
    pub id: u64,
    /// Identifier of the client who raised the request.
    pub client_id: u64,
    /// Service category identifier.
    pub category_id: u64,
    /// Where the service should take place, when known.
    pub location: Option<Coord<f64>>,
}

impl ServiceRequest {
    /// Construct a request.
    #[must_use]
    pub const fn new(
        id: u64,
        client_id: u64,
        category_id: u64,
        location: Option<Coord<f64>>,
    ) -> Self {
        Self {
            id,
            client_id,
            category_id,
            location,
        }
    }
}
