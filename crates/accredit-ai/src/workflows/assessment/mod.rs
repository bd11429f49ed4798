//! Versioned assessment matrix editing, evidence linkage, and scoring.
//!
//! The ledger records every commit as an immutable version and resolves the
//! current state per `(unit, criterion)` key at read time; the reference
//! resolver reuses the same resolution for a foreign unit's submission. The
//! scoring side is split between the sandboxed formula engine (quantitative)
//! and the reasoning-service reviewer (qualitative), with the score-band
//! registry supplying the color classification for both.

pub mod attachments;
pub mod bands;
pub mod domain;
pub mod evidence;
pub mod ledger;
pub mod qualitative;
pub mod reference;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use bands::{validate as validate_bands, BandEditor, BandError, ScoreBand, ScoreBandRegistry};
pub use domain::{
    AnswerEntry, AnswerSet, Attachment, AttachmentId, AuthorId, CriterionKey, DetailItem,
    DetailItemKind, MatrixDefinition, NewVersion, UnitId, Version, VersionId,
};
pub use evidence::{EvidenceError, EvidenceGateway, EvidenceUpload, GoogleDriveEvidence};
pub use ledger::{LedgerError, VersionLedger};
pub use qualitative::{QualitativeReviewer, ReviewError};
pub use reference::{ReferenceResolver, ReferenceView};
pub use repository::{
    BandStore, MatrixCatalog, QualitativeReview, ReasoningError, ReasoningGateway, ReviewRequest,
    StoreError, VersionStore,
};
pub use router::assessment_router;
pub use scoring::{
    ConditionalFormula, CountedInputs, FormulaError, FormulaParameters, FormulaSpec,
    ScoreFormulaEngine,
};
pub use service::{AssessmentError, AssessmentService, AssessmentWorkspace, VersionStamp};
