//! SQLite-backed technician directory.

use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
};

use geo::Coord;
use log::debug;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use thiserror::Error;

use crate::{PriceAggregate, RatingAggregate, ServiceRequest, Technician};

use super::{DirectoryError, TechnicianDirectory};

/// Tables the directory reads from.
const REQUIRED_TABLES: [&str; 6] = [
    "service_requests",
    "technicians",
    "technician_locations",
    "ratings",
    "technician_offers",
    "service_assignments",
];

/// Error raised when opening or reading the directory database.
#[derive(Debug, Error)]
pub enum SqliteDirectoryError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The database lacks a table the directory reads.
    #[error("SQLite database is missing table `{table}`")]
    MissingTable {
        /// Name of the absent table.
        table: &'static str,
    },
    /// Generic SQLite error when reading rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

/// Read-only directory backed by a SQLite database.
///
/// A technician with several `technician_locations` rows is located at the
/// most recently inserted one.
pub struct SqliteDirectory {
    connection: Connection,
    path: PathBuf,
}

impl fmt::Debug for SqliteDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDirectory")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteDirectory {
    /// Open the database read-only and check its schema.
    ///
    /// # Errors
    /// Returns [`SqliteDirectoryError::OpenDatabase`] when the file cannot be
    /// opened and [`SqliteDirectoryError::MissingTable`] when a required table
    /// is absent.
    pub fn open<P: AsRef<Path>>(database_path: P) -> Result<Self, SqliteDirectoryError> {
        let path = database_path.as_ref();
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| SqliteDirectoryError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        ensure_tables_exist(&connection)?;
        debug!("opened technician directory at {}", path.display());
        Ok(Self {
            connection,
            path: path.to_path_buf(),
        })
    }

    fn group_counts<T>(
        &self,
        query: &str,
        map: impl Fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<HashMap<u64, T>, SqliteDirectoryError> {
        let mut statement = self.connection.prepare(query)?;
        let mut rows = statement.query([])?;
        let mut out = HashMap::new();
        while let Some(row) = rows.next()? {
            let id: u64 = row.get(0)?;
            out.insert(id, map(row)?);
        }
        Ok(out)
    }
}

fn ensure_tables_exist(connection: &Connection) -> Result<(), SqliteDirectoryError> {
    let mut statement =
        connection.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    for table in REQUIRED_TABLES {
        if !statement.exists([table])? {
            return Err(SqliteDirectoryError::MissingTable { table });
        }
    }
    Ok(())
}

fn location(lat: Option<f64>, lon: Option<f64>) -> Option<Coord<f64>> {
    match (lat, lon) {
        (Some(y), Some(x)) => Some(Coord { x, y }),
        _ => None,
    }
}

fn lookup_error(operation: &'static str) -> impl FnOnce(SqliteDirectoryError) -> DirectoryError {
    move |err| DirectoryError::lookup(operation, err)
}

impl TechnicianDirectory for SqliteDirectory {
    fn find_request(&self, id: u64) -> Result<Option<ServiceRequest>, DirectoryError> {
        self.connection
            .query_row(
                "SELECT id, client_id, category_id, lat, lon FROM service_requests WHERE id = ?1",
                [id],
                |row| {
                    Ok(ServiceRequest::new(
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        location(row.get(3)?, row.get(4)?),
                    ))
                },
            )
            .optional()
            .map_err(SqliteDirectoryError::from)
            .map_err(lookup_error("find_request"))
    }

    fn available_technicians(&self) -> Result<Vec<Technician>, DirectoryError> {
        let read = || -> Result<Vec<Technician>, SqliteDirectoryError> {
            let mut statement = self.connection.prepare(
                "SELECT t.id, l.lat, l.lon, t.average_rating, t.available
                 FROM technicians t
                 LEFT JOIN technician_locations l ON l.rowid = (
                     SELECT MAX(rowid) FROM technician_locations WHERE technician_id = t.id
                 )
                 WHERE t.available = 1
                 ORDER BY t.id",
            )?;
            let rows = statement.query_map([], |row| {
                Ok(Technician {
                    id: row.get(0)?,
                    location: location(row.get(1)?, row.get(2)?),
                    average_rating: row.get(3)?,
                    available: row.get(4)?,
                })
            })?;
            Ok(rows.collect::<Result<_, _>>()?)
        };
        read().map_err(lookup_error("available_technicians"))
    }

    fn rating_aggregates(&self) -> Result<HashMap<u64, RatingAggregate>, DirectoryError> {
        self.group_counts(
            "SELECT technician_id, AVG(score), COUNT(*) FROM ratings GROUP BY technician_id",
            |row| {
                Ok(RatingAggregate {
                    average: row.get(1)?,
                    count: row.get(2)?,
                })
            },
        )
        .map_err(lookup_error("rating_aggregates"))
    }

    fn price_aggregates(&self) -> Result<HashMap<u64, PriceAggregate>, DirectoryError> {
        self.group_counts(
            "SELECT technician_id, AVG(price), COUNT(*) FROM technician_offers \
             GROUP BY technician_id",
            |row| {
                Ok(PriceAggregate {
                    average_price: row.get(1)?,
                    offer_count: row.get(2)?,
                })
            },
        )
        .map_err(lookup_error("price_aggregates"))
    }

    fn completed_services(&self) -> Result<HashMap<u64, u64>, DirectoryError> {
        self.group_counts(
            "SELECT technician_id, COUNT(*) FROM service_assignments GROUP BY technician_id",
            |row| row.get(1),
        )
        .map_err(lookup_error("completed_services"))
    }
}
