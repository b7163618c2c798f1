//! Data access traits for requests and technicians.
//!
//! The [`TechnicianDirectory`] trait is the read-only interface the
//! recommender uses when no inline payload is supplied. Aggregate lookups
//! return maps keyed by technician identifier; technicians missing from a
//! map simply have no recorded history.

use std::{collections::HashMap, error::Error as StdError};

use thiserror::Error;

use crate::{AggregateTables, PriceAggregate, RatingAggregate, ServiceRequest, Technician};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteDirectory, SqliteDirectoryError};

/// Failures raised by a [`TechnicianDirectory`].
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No directory is configured.
    #[error("technician directory is not configured")]
    Unavailable,
    /// A lookup failed in the backing store.
    #[error("directory lookup `{operation}` failed")]
    Lookup {
        /// Name of the failed lookup.
        operation: &'static str,
        /// Underlying store error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl DirectoryError {
    /// Wrap a backend error raised by `operation`.
    pub fn lookup(operation: &'static str, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Lookup {
            operation,
            source: Box::new(source),
        }
    }
}

/// Read-only access to requests, technicians and their history.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use techmatch_core::{
///     DirectoryError, PriceAggregate, RatingAggregate, ServiceRequest, Technician,
///     TechnicianDirectory,
/// };
///
/// struct Empty;
///
/// impl TechnicianDirectory for Empty {
///     fn find_request(&self, _id: u64) -> Result<Option<ServiceRequest>, DirectoryError> {
///         Ok(None)
///     }
///     fn available_technicians(&self) -> Result<Vec<Technician>, DirectoryError> {
///         Ok(Vec::new())
///     }
///     fn rating_aggregates(&self) -> Result<HashMap<u64, RatingAggregate>, DirectoryError> {
///         Ok(HashMap::new())
///     }
///     fn price_aggregates(&self) -> Result<HashMap<u64, PriceAggregate>, DirectoryError> {
///         Ok(HashMap::new())
///     }
///     fn completed_services(&self) -> Result<HashMap<u64, u64>, DirectoryError> {
///         Ok(HashMap::new())
///     }
/// }
///
/// assert!(Empty.find_request(1).expect("lookup").is_none());
/// ```
pub trait TechnicianDirectory {
    /// Fetch a request by identifier.
    ///
    /// # Errors
    /// Returns [`DirectoryError`] when the lookup itself fails. An unknown
    /// identifier is `Ok(None)`.
    fn find_request(&self, id: u64) -> Result<Option<ServiceRequest>, DirectoryError>;

    /// List technicians currently accepting work, ordered by identifier.
    ///
    /// # Errors
    /// Returns [`DirectoryError`] when the lookup fails.
    fn available_technicians(&self) -> Result<Vec<Technician>, DirectoryError>;

    /// Rating average and count per technician.
    ///
    /// # Errors
    /// Returns [`DirectoryError`] when the lookup fails.
    fn rating_aggregates(&self) -> Result<HashMap<u64, RatingAggregate>, DirectoryError>;

    /// Average offer price and offer count per technician.
    ///
    /// # Errors
    /// Returns [`DirectoryError`] when the lookup fails.
    fn price_aggregates(&self) -> Result<HashMap<u64, PriceAggregate>, DirectoryError>;

    /// Completed assignment count per technician.
    ///
    /// # Errors
    /// Returns [`DirectoryError`] when the lookup fails.
    fn completed_services(&self) -> Result<HashMap<u64, u64>, DirectoryError>;

    /// Run every aggregate lookup.
    ///
    /// # Errors
    /// Returns the first [`DirectoryError`] raised.
    fn aggregate_tables(&self) -> Result<AggregateTables, DirectoryError> {
        Ok(AggregateTables {
            ratings: self.rating_aggregates()?,
            prices: self.price_aggregates()?,
            completed: self.completed_services()?,
        })
    }
}

impl<D: TechnicianDirectory + ?Sized> TechnicianDirectory for &D {
    fn find_request(&self, id: u64) -> Result<Option<ServiceRequest>, DirectoryError> {
        (**self).find_request(id)
    }

    fn available_technicians(&self) -> Result<Vec<Technician>, DirectoryError> {
        (**self).available_technicians()
    }

    fn rating_aggregates(&self) -> Result<HashMap<u64, RatingAggregate>, DirectoryError> {
        (**self).rating_aggregates()
    }

    fn price_aggregates(&self) -> Result<HashMap<u64, PriceAggregate>, DirectoryError> {
        (**self).price_aggregates()
    }

    fn completed_services(&self) -> Result<HashMap<u64, u64>, DirectoryError> {
        (**self).completed_services()
    }
}

/// An absent directory fails every lookup with
/// [`DirectoryError::Unavailable`].
impl<D: TechnicianDirectory> TechnicianDirectory for Option<D> {
    fn find_request(&self, id: u64) -> Result<Option<ServiceRequest>, DirectoryError> {
        self.as_ref()
            .ok_or(DirectoryError::Unavailable)?
            .find_request(id)
    }

    fn available_technicians(&self) -> Result<Vec<Technician>, DirectoryError> {
        self.as_ref()
            .ok_or(DirectoryError::Unavailable)?
            .available_technicians()
    }

    fn rating_aggregates(&self) -> Result<HashMap<u64, RatingAggregate>, DirectoryError> {
        self.as_ref()
            .ok_or(DirectoryError::Unavailable)?
            .rating_aggregates()
    }

    fn price_aggregates(&self) -> Result<HashMap<u64, PriceAggregate>, DirectoryError> {
        self.as_ref()
            .ok_or(DirectoryError::Unavailable)?
            .price_aggregates()
    }

    fn completed_services(&self) -> Result<HashMap<u64, u64>, DirectoryError> {
        self.as_ref()
            .ok_or(DirectoryError::Unavailable)?
            .completed_services()
    }
}
