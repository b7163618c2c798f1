//! The recommendation operation.
//!
//! [`Recommender::recommend`] gathers a request and its candidates, either
//! from a [`TechnicianDirectory`] or from an [`InlinePayload`], and pushes
//! them through assembly, normalisation, scoring and ranking. The call either
//! returns the full ranking or fails; nothing is retried.

use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::{
    CandidateRecord, DirectoryError, FeatureError, FeatureTable, FeatureVector, InlinePayload,
    ModelError, NotReady, PayloadError, Readiness, ScoredTechnician, ScoringContext,
    ServiceRequest, TechnicianDirectory, assemble,
    model::{check_batch, check_scores},
    rank,
};

/// Coarse failure classes for callers mapping errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// A scoring component is not loaded.
    NotReady,
    /// The caller supplied invalid input.
    Validation,
    /// A lookup against the datastore failed.
    Upstream,
    /// The model rejected its input or produced unusable output.
    Model,
}

/// Failures raised by [`Recommender::recommend`].
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The normaliser or model is missing.
    #[error(transparent)]
    NotReady(#[from] NotReady),
    /// The inline payload is malformed.
    #[error("invalid inline payload: {0}")]
    Payload(#[from] PayloadError),
    /// The feature table is missing columns or ragged.
    #[error("invalid feature table: {0}")]
    Features(#[from] FeatureError),
    /// A datastore lookup failed.
    #[error("technician directory lookup failed: {0}")]
    Directory(#[from] DirectoryError),
    /// The model rejected its input or output.
    #[error("scoring failed: {0}")]
    Model(#[from] ModelError),
}

impl RecommendError {
    /// Classify the failure.
    ///
    /// # Examples
    /// ```
    /// use techmatch_core::{Component, ErrorKind, NotReady, RecommendError};
    ///
    /// let err = RecommendError::from(NotReady { component: Component::Model });
    /// assert_eq!(err.kind(), ErrorKind::NotReady);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotReady(_) => ErrorKind::NotReady,
            Self::Payload(_) | Self::Features(_) => ErrorKind::Validation,
            Self::Directory(_) => ErrorKind::Upstream,
            Self::Model(_) => ErrorKind::Model,
        }
    }
}

/// Ranks technicians for service requests.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use techmatch_core::{
///     Recommender, test_support::{DirectorySeed, MemoryDirectory, ready_context},
/// };
///
/// let directory = MemoryDirectory::from_seed(&DirectorySeed::nearby_pair());
/// let recommender = Recommender::new(Arc::new(ready_context()), directory);
/// let ranked = recommender
///     .recommend(DirectorySeed::REQUEST_ID, None)
///     .expect("recommendation succeeds");
/// let ids: Vec<u64> = ranked.iter().map(|s| s.technician_id).collect();
/// assert_eq!(ids, vec![1, 2]);
/// ```
#[derive(Debug)]
pub struct Recommender<D> {
    context: Arc<ScoringContext>,
    directory: D,
}

impl<D: TechnicianDirectory> Recommender<D> {
    /// Combine a scoring context with a directory.
    pub const fn new(context: Arc<ScoringContext>, directory: D) -> Self {
        Self { context, directory }
    }

    /// Borrow the scoring context.
    #[must_use]
    pub fn context(&self) -> &ScoringContext {
        &self.context
    }

    /// Report which components are loaded.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.context.readiness()
    }

    /// Report whether recommendations can be served.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.context.is_ready()
    }

    /// Rank candidates for `request_id`, best first.
    ///
    /// With `payload` set, the request and candidates come from the payload
    /// and the directory is not consulted. Otherwise the request and all
    /// available technicians are read from the directory. An unknown request
    /// or an empty candidate set yields an empty ranking.
    ///
    /// # Errors
    /// Returns [`RecommendError`]; see [`RecommendError::kind`] for the
    /// failure classes. Readiness is checked before any lookup.
    pub fn recommend(
        &self,
        request_id: u64,
        payload: Option<&InlinePayload>,
    ) -> Result<Vec<ScoredTechnician>, RecommendError> {
        self.context.normalizer()?;
        self.context.model()?;

        let gathered = match payload {
            Some(inline) => Some(inline.into_parts(request_id)?),
            None => self.lookup(request_id)?,
        };
        let Some((request, candidates)) = gathered else {
            debug!("request {request_id} not found");
            return Ok(Vec::new());
        };
        if candidates.is_empty() {
            debug!("request {request_id} has no candidates");
            return Ok(Vec::new());
        }

        let table = assemble(&request, &candidates);
        let vectors = table.into_vectors()?;
        let scores = self.score_vectors(&vectors)?;
        debug!(
            "request {request_id}: scored {} candidates",
            scores.len()
        );

        let scored = candidates
            .into_iter()
            .zip(vectors)
            .zip(scores)
            .map(|((candidate, features), score)| ScoredTechnician {
                technician_id: candidate.technician_id,
                candidate,
                features,
                score,
            })
            .collect();
        Ok(rank(scored))
    }

    /// Score a precomputed feature table.
    ///
    /// Returns `(technician_id, score)` pairs, best first, with ties kept in
    /// table order.
    ///
    /// # Errors
    /// Returns [`RecommendError::Features`] when the table is missing columns
    /// or ragged, and the readiness and model failures of
    /// [`Recommender::recommend`].
    pub fn score_table(&self, table: FeatureTable) -> Result<Vec<(u64, f64)>, RecommendError> {
        let ids = table.technician_ids().to_vec();
        let vectors = table.into_vectors()?;
        let scores = self.score_vectors(&vectors)?;
        let mut ranked: Vec<_> = ids.into_iter().zip(scores).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked)
    }

    fn lookup(
        &self,
        request_id: u64,
    ) -> Result<Option<(ServiceRequest, Vec<CandidateRecord>)>, DirectoryError> {
        let Some(request) = self.directory.find_request(request_id)? else {
            return Ok(None);
        };
        let technicians = self.directory.available_technicians()?;
        if technicians.is_empty() {
            return Ok(Some((request, Vec::new())));
        }
        let tables = self.directory.aggregate_tables()?;
        let candidates = technicians
            .into_iter()
            .map(|technician| tables.attach(technician))
            .collect();
        Ok(Some((request, candidates)))
    }

    fn score_vectors(&self, vectors: &[FeatureVector]) -> Result<Vec<f64>, RecommendError> {
        let normalizer = self.context.normalizer()?;
        let model = self.context.model()?;
        let normalised = normalizer.transform_batch(vectors);
        check_batch(&normalised)?;
        let scores = model.score(&normalised)?;
        check_scores(normalised.len(), &scores)?;
        Ok(scores)
    }
}
