use serde::{Deserialize, Serialize};

use super::bands::ScoreBand;
use super::domain::{CriterionKey, MatrixDefinition, NewVersion, UnitId, Version};
use super::scoring::FormulaSpec;

/// Append-only storage abstraction for committed versions.
///
/// `append` assigns the id and timestamp; ids increase monotonically across
/// the whole store, so insertion order is recoverable even when the clock is
/// too coarse to separate two commits. Implementations must never mutate or
/// drop previously appended versions.
pub trait VersionStore: Send + Sync {
    fn append(&self, draft: NewVersion) -> Result<Version, StoreError>;

    /// Every version ever committed for `(unit, task)`, in no particular
    /// order; the ledger derives "latest" and "history" from the full set.
    fn for_key(&self, unit: &UnitId, task: &CriterionKey) -> Result<Vec<Version>, StoreError>;
}

/// Storage abstraction for the score-band set. `replace` swaps the whole
/// list in one operation, all-or-nothing.
pub trait BandStore: Send + Sync {
    fn load(&self) -> Result<Vec<ScoreBand>, StoreError>;
    fn replace(&self, bands: Vec<ScoreBand>) -> Result<(), StoreError>;
}

/// Read-side catalog of externally managed configuration: matrix definitions
/// and the formula spec for quantitative scoring.
pub trait MatrixCatalog: Send + Sync {
    fn definition(&self, key: &CriterionKey) -> Result<Option<MatrixDefinition>, StoreError>;
    fn formula(&self, key: &CriterionKey) -> Result<Option<FormulaSpec>, StoreError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Per-criterion review request sent to the external reasoning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub task: CriterionKey,
    pub seq: String,
    /// Rubric rows (guidance, indicators, score bands) briefing the reviewer.
    pub rubric: Vec<String>,
    pub answer: String,
}

/// Reasoning-service response. Both fields are mandatory; a reply missing
/// either is treated as a failed call, never as a partial score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeReview {
    pub score: f64,
    pub feedback: String,
}

/// Trait describing the outbound reasoning-service adapter.
pub trait ReasoningGateway: Send + Sync {
    fn review(&self, request: &ReviewRequest) -> Result<QualitativeReview, ReasoningError>;
}

/// Reasoning-service failure.
#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("reasoning service unavailable: {0}")]
    Transport(String),
    #[error("reasoning service returned an incomplete review: {0}")]
    Incomplete(String),
}
