use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::attachments::EvidenceLinker;
use super::bands::{BandError, ScoreBand, ScoreBandRegistry};
use super::domain::{
    AnswerSet, Attachment, AttachmentId, AuthorId, CriterionKey, MatrixDefinition, UnitId, Version,
    VersionId,
};
use super::evidence::{EvidenceError, EvidenceGateway, EvidenceUpload};
use super::ledger::{LedgerError, VersionLedger};
use super::qualitative::{QualitativeReviewer, ReviewError};
use super::reference::{ReferenceResolver, ReferenceView};
use super::repository::{
    BandStore, MatrixCatalog, QualitativeReview, ReasoningGateway, StoreError, VersionStore,
};
use super::scoring::{CountedInputs, FormulaError, ScoreFormulaEngine};

/// Everything a client needs to render one assessment task: the matrix, the
/// unit's current answers, the optional read-only reference view, and the
/// score bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentWorkspace {
    pub matrix: MatrixDefinition,
    pub answers: AnswerSet,
    /// Stamp of the commit the answers came from; absent when the unit has
    /// no version yet and `answers` is the synthesized default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionStamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceView>,
    pub bands: Vec<ScoreBand>,
}

/// Lightweight commit metadata for workspace payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionStamp {
    pub id: VersionId,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub author: AuthorId,
}

impl VersionStamp {
    fn from_version(version: &Version) -> Self {
        Self {
            id: version.id,
            message: version.message.clone(),
            created_at: version.created_at,
            author: version.author.clone(),
        }
    }
}

/// Service composing the catalog, ledger, reference resolver, evidence
/// linker, formula engine, and qualitative reviewer.
pub struct AssessmentService<C, S, B, G, R> {
    catalog: Arc<C>,
    ledger: VersionLedger<S>,
    resolver: ReferenceResolver<S>,
    bands: ScoreBandRegistry<B>,
    linker: EvidenceLinker<G>,
    reviewer: QualitativeReviewer<R>,
    engine: ScoreFormulaEngine,
}

impl<C, S, B, G, R> AssessmentService<C, S, B, G, R>
where
    C: MatrixCatalog + 'static,
    S: VersionStore + 'static,
    B: BandStore + 'static,
    G: EvidenceGateway + 'static,
    R: ReasoningGateway + 'static,
{
    pub fn new(
        catalog: Arc<C>,
        versions: Arc<S>,
        bands: Arc<B>,
        evidence: Arc<G>,
        reasoning: Arc<R>,
    ) -> Self {
        Self {
            catalog,
            ledger: VersionLedger::new(versions.clone()),
            resolver: ReferenceResolver::new(versions),
            bands: ScoreBandRegistry::new(bands),
            linker: EvidenceLinker::new(evidence),
            reviewer: QualitativeReviewer::new(reasoning),
            engine: ScoreFormulaEngine::new(),
        }
    }

    fn matrix(&self, key: &CriterionKey) -> Result<MatrixDefinition, AssessmentError> {
        self.catalog
            .definition(key)?
            .ok_or_else(|| AssessmentError::UnknownMatrix(key.clone()))
    }

    /// Load the full editing workspace for `(unit, key)`. The current and
    /// reference lookups are independent; neither depends on the other's
    /// outcome, and a missing version on either side renders as the default
    /// answer set rather than an error.
    pub fn workspace(
        &self,
        unit: &UnitId,
        key: &CriterionKey,
        reference_unit: Option<&UnitId>,
    ) -> Result<AssessmentWorkspace, AssessmentError> {
        let matrix = self.matrix(key)?;

        let latest = self.ledger.latest(unit, key)?;
        let version = latest.as_ref().map(VersionStamp::from_version);
        let answers = latest
            .map(|version| version.details)
            .unwrap_or_else(|| matrix.default_answer_set());

        let reference = reference_unit
            .map(|foreign| self.resolver.resolve(foreign, &matrix))
            .transpose()?;

        let bands = self.bands.load()?;

        Ok(AssessmentWorkspace {
            matrix,
            answers,
            version,
            reference,
            bands,
        })
    }

    /// Commit a draft as a new immutable version.
    pub fn commit(
        &self,
        unit: &UnitId,
        key: &CriterionKey,
        answers: AnswerSet,
        message: &str,
        author: &AuthorId,
    ) -> Result<Version, AssessmentError> {
        let matrix = self.matrix(key)?;
        let version = self.ledger.commit(unit, &matrix, answers, message, author)?;
        info!(unit = %unit, task = %key, version = version.id.0, "committed assessment version");
        Ok(version)
    }

    /// Commit history for the key, newest first.
    pub fn history(&self, unit: &UnitId, key: &CriterionKey) -> Result<Vec<Version>, AssessmentError> {
        let matrix = self.matrix(key)?;
        Ok(self.ledger.history(unit, &matrix.key)?)
    }

    /// Upload evidence files for one criterion row and return the merged
    /// attachment list for the caller's draft.
    pub fn attach_evidence(
        &self,
        unit: &UnitId,
        key: &CriterionKey,
        seq: &str,
        existing: &[Attachment],
        files: Vec<EvidenceUpload>,
    ) -> Result<Vec<Attachment>, AssessmentError> {
        let matrix = self.matrix(key)?;
        if !matrix.criterion_seqs().contains(&seq) {
            return Err(AssessmentError::Ledger(LedgerError::UnknownSeq {
                task: matrix.key,
                seq: seq.to_string(),
            }));
        }
        Ok(self.linker.attach(unit, key, seq, existing, files)?)
    }

    /// Remove one attachment from a draft list; remote deletion only happens
    /// for persisted entries.
    pub fn detach_evidence(
        &self,
        attachments: &[Attachment],
        target: &Attachment,
    ) -> Result<Vec<Attachment>, AssessmentError> {
        Ok(self.linker.detach(attachments, target)?)
    }

    /// Delete a persisted attachment by id.
    pub fn delete_evidence(&self, id: &AttachmentId) -> Result<(), AssessmentError> {
        Ok(self.linker.delete_persisted(id)?)
    }

    /// Quantitative score for the criterion from its stored formula spec.
    pub fn quantitative_score(
        &self,
        key: &CriterionKey,
        inputs: &CountedInputs,
    ) -> Result<f64, AssessmentError> {
        let spec = self
            .catalog
            .formula(key)?
            .ok_or_else(|| AssessmentError::UnknownFormula(key.clone()))?;
        Ok(self.engine.evaluate(&spec, inputs)?)
    }

    /// Qualitative review of one criterion answer. Operates on the caller's
    /// draft when one is supplied, otherwise on the unit's current answers;
    /// returns the updated draft together with the review. A gateway failure
    /// leaves the draft untouched and surfaces as an upstream error.
    pub fn qualitative_review(
        &self,
        unit: &UnitId,
        key: &CriterionKey,
        seq: &str,
        draft: Option<AnswerSet>,
    ) -> Result<(AnswerSet, QualitativeReview), AssessmentError> {
        let matrix = self.matrix(key)?;
        let mut answers = match draft {
            Some(answers) => answers,
            None => self.ledger.current_answers(unit, &matrix)?,
        };
        let review = self.reviewer.review_entry(&matrix, &mut answers, seq)?;
        Ok((answers, review))
    }

    /// The persisted score-band set.
    pub fn score_bands(&self) -> Result<Vec<ScoreBand>, AssessmentError> {
        Ok(self.bands.load()?)
    }

    /// Validate and persist a replacement band set, all-or-nothing.
    pub fn save_score_bands(&self, bands: Vec<ScoreBand>) -> Result<(), AssessmentError> {
        self.bands.save(bands)?;
        Ok(())
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("no matrix definition for criterion {0}")]
    UnknownMatrix(CriterionKey),
    #[error("no formula spec for criterion {0}")]
    UnknownFormula(CriterionKey),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Formula(#[from] FormulaError),
    #[error(transparent)]
    Band(#[from] BandError),
    #[error(transparent)]
    Evidence(#[from] EvidenceError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
