use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};

use crate::workflows::assessment::bands::ScoreBand;
use crate::workflows::assessment::domain::{
    AnswerEntry, AnswerSet, Attachment, AttachmentId, AuthorId, CriterionKey, DetailItem,
    DetailItemKind, MatrixDefinition, NewVersion, UnitId, Version, VersionId,
};
use crate::workflows::assessment::evidence::{EvidenceError, EvidenceGateway, EvidenceUpload};
use crate::workflows::assessment::repository::{
    BandStore, MatrixCatalog, QualitativeReview, ReasoningError, ReasoningGateway, ReviewRequest,
    StoreError, VersionStore,
};
use crate::workflows::assessment::scoring::{ConditionalFormula, FormulaParameters, FormulaSpec};
use crate::workflows::assessment::service::AssessmentService;

pub(super) fn unit_a() -> UnitId {
    UnitId("informatics".to_string())
}

pub(super) fn unit_b() -> UnitId {
    UnitId("mathematics".to_string())
}

pub(super) fn author() -> AuthorId {
    AuthorId("reviewer-1".to_string())
}

pub(super) fn sample_key() -> CriterionKey {
    CriterionKey::new(9, "A")
}

pub(super) fn sample_matrix() -> MatrixDefinition {
    MatrixDefinition::new(
        sample_key(),
        vec![
            DetailItem {
                seq: "1".to_string(),
                kind: DetailItemKind::Guidance,
                reference: "Describe the curriculum design and review process.".to_string(),
            },
            DetailItem {
                seq: "2".to_string(),
                kind: DetailItemKind::Indicator,
                reference: "Evidence of periodic curriculum review.".to_string(),
            },
            DetailItem {
                seq: "3".to_string(),
                kind: DetailItemKind::Criterion,
                reference: String::new(),
            },
            DetailItem {
                seq: "3".to_string(),
                kind: DetailItemKind::ScoreBand4,
                reference: "Annual review with documented stakeholder input.".to_string(),
            },
            DetailItem {
                seq: "3".to_string(),
                kind: DetailItemKind::ScoreBand2,
                reference: "Review happens without stakeholder involvement.".to_string(),
            },
            DetailItem {
                seq: "4".to_string(),
                kind: DetailItemKind::Criterion,
                reference: String::new(),
            },
        ],
    )
}

pub(super) fn answers_with(seq: &str, text: &str) -> AnswerSet {
    let mut answers = sample_matrix().default_answer_set();
    answers
        .entry_mut(seq)
        .expect("seq present in default answers")
        .answer = text.to_string();
    answers
}

pub(super) fn sample_formula() -> FormulaSpec {
    FormulaSpec {
        main: "RK = a*N1 + b*N2 + c*N3 / NDTPS".to_string(),
        parameters: FormulaParameters::default(),
        conditions: vec![ConditionalFormula {
            when: "NDTPS == 0".to_string(),
            then: "0".to_string(),
        }],
    }
}

pub(super) fn sample_bands() -> Vec<ScoreBand> {
    vec![
        ScoreBand::new("red", 0.0, 2.0),
        ScoreBand::new("yellow", 2.0, 3.0),
        ScoreBand::new("green", 3.0, 4.0),
    ]
}

pub(super) fn persisted_attachment(id: &str, name: &str, seq: &str) -> Attachment {
    Attachment {
        id: Some(AttachmentId(id.to_string())),
        name: name.to_string(),
        url: format!("https://files.example/{id}"),
        seq: seq.to_string(),
    }
}

pub(super) fn staged_attachment(name: &str, seq: &str) -> Attachment {
    Attachment {
        id: None,
        name: name.to_string(),
        url: String::new(),
        seq: seq.to_string(),
    }
}

pub(super) fn upload(name: &str) -> EvidenceUpload {
    EvidenceUpload {
        name: name.to_string(),
        content_type: Some("application/pdf".to_string()),
        bytes: b"%PDF-1.4".to_vec(),
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryVersionStore {
    versions: Mutex<Vec<Version>>,
    sequence: AtomicU64,
}

impl VersionStore for MemoryVersionStore {
    fn append(&self, draft: NewVersion) -> Result<Version, StoreError> {
        let id = VersionId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let version = Version {
            id,
            unit: draft.unit,
            task: draft.task,
            message: draft.message,
            details: draft.details,
            created_at: Utc::now(),
            author: draft.author,
        };
        self.versions
            .lock()
            .expect("version mutex poisoned")
            .push(version.clone());
        Ok(version)
    }

    fn for_key(&self, unit: &UnitId, task: &CriterionKey) -> Result<Vec<Version>, StoreError> {
        let guard = self.versions.lock().expect("version mutex poisoned");
        Ok(guard
            .iter()
            .filter(|version| &version.unit == unit && &version.task == task)
            .cloned()
            .collect())
    }
}

/// Store double returning preset versions, for exercising tie-break and
/// ordering rules without a live clock.
pub(super) struct PresetVersionStore {
    pub(super) versions: Vec<Version>,
}

impl VersionStore for PresetVersionStore {
    fn append(&self, _draft: NewVersion) -> Result<Version, StoreError> {
        Err(StoreError::Unavailable("preset store is read only".to_string()))
    }

    fn for_key(&self, unit: &UnitId, task: &CriterionKey) -> Result<Vec<Version>, StoreError> {
        Ok(self
            .versions
            .iter()
            .filter(|version| &version.unit == unit && &version.task == task)
            .cloned()
            .collect())
    }
}

pub(super) fn preset_version(
    id: u64,
    unit: &UnitId,
    message: &str,
    timestamp_secs: i64,
) -> Version {
    Version {
        id: VersionId(id),
        unit: unit.clone(),
        task: sample_key(),
        message: message.to_string(),
        details: sample_matrix().default_answer_set(),
        created_at: Utc.timestamp_opt(timestamp_secs, 0).single().expect("valid timestamp"),
        author: author(),
    }
}

pub(super) struct UnavailableVersionStore;

impl VersionStore for UnavailableVersionStore {
    fn append(&self, _draft: NewVersion) -> Result<Version, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn for_key(&self, _unit: &UnitId, _task: &CriterionKey) -> Result<Vec<Version>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryBandStore {
    bands: Mutex<Vec<ScoreBand>>,
}

impl MemoryBandStore {
    pub(super) fn seeded(bands: Vec<ScoreBand>) -> Self {
        Self {
            bands: Mutex::new(bands),
        }
    }
}

impl BandStore for MemoryBandStore {
    fn load(&self) -> Result<Vec<ScoreBand>, StoreError> {
        Ok(self.bands.lock().expect("band mutex poisoned").clone())
    }

    fn replace(&self, bands: Vec<ScoreBand>) -> Result<(), StoreError> {
        *self.bands.lock().expect("band mutex poisoned") = bands;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryCatalog {
    definitions: HashMap<CriterionKey, MatrixDefinition>,
    formulas: HashMap<CriterionKey, FormulaSpec>,
}

impl MemoryCatalog {
    pub(super) fn standard() -> Self {
        let mut definitions = HashMap::new();
        definitions.insert(sample_key(), sample_matrix());
        let mut formulas = HashMap::new();
        formulas.insert(sample_key(), sample_formula());
        Self {
            definitions,
            formulas,
        }
    }
}

impl MatrixCatalog for MemoryCatalog {
    fn definition(&self, key: &CriterionKey) -> Result<Option<MatrixDefinition>, StoreError> {
        Ok(self.definitions.get(key).cloned())
    }

    fn formula(&self, key: &CriterionKey) -> Result<Option<FormulaSpec>, StoreError> {
        Ok(self.formulas.get(key).cloned())
    }
}

#[derive(Debug, Default)]
pub(super) struct MemoryEvidenceGateway {
    sequence: AtomicU64,
    uploads: Mutex<Vec<String>>,
    deleted: Mutex<Vec<AttachmentId>>,
}

impl MemoryEvidenceGateway {
    pub(super) fn uploads(&self) -> Vec<String> {
        self.uploads.lock().expect("upload mutex poisoned").clone()
    }

    pub(super) fn deleted(&self) -> Vec<AttachmentId> {
        self.deleted.lock().expect("delete mutex poisoned").clone()
    }
}

impl EvidenceGateway for MemoryEvidenceGateway {
    fn upload(
        &self,
        _unit: &UnitId,
        _task: &CriterionKey,
        seq: &str,
        files: Vec<EvidenceUpload>,
    ) -> Result<Vec<Attachment>, EvidenceError> {
        let mut attachments = Vec::with_capacity(files.len());
        for file in files {
            let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            self.uploads
                .lock()
                .expect("upload mutex poisoned")
                .push(file.name.clone());
            attachments.push(Attachment {
                id: Some(AttachmentId(format!("ev-{id:04}"))),
                name: file.name,
                url: format!("https://files.example/ev-{id:04}"),
                seq: seq.to_string(),
            });
        }
        Ok(attachments)
    }

    fn delete(&self, id: &AttachmentId) -> Result<(), EvidenceError> {
        self.deleted
            .lock()
            .expect("delete mutex poisoned")
            .push(id.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(super) struct StubReasoningGateway {
    requests: Mutex<Vec<ReviewRequest>>,
}

impl StubReasoningGateway {
    pub(super) fn requests(&self) -> Vec<ReviewRequest> {
        self.requests.lock().expect("request mutex poisoned").clone()
    }
}

impl ReasoningGateway for StubReasoningGateway {
    fn review(&self, request: &ReviewRequest) -> Result<QualitativeReview, ReasoningError> {
        self.requests
            .lock()
            .expect("request mutex poisoned")
            .push(request.clone());
        Ok(QualitativeReview {
            score: 3.0,
            feedback: "Answer addresses the indicator with partial evidence.".to_string(),
        })
    }
}

#[derive(Debug, Default)]
pub(super) struct FailingReasoningGateway;

impl ReasoningGateway for FailingReasoningGateway {
    fn review(&self, _request: &ReviewRequest) -> Result<QualitativeReview, ReasoningError> {
        Err(ReasoningError::Transport("reasoning service timed out".to_string()))
    }
}

#[derive(Debug, Default)]
pub(super) struct IncompleteReasoningGateway;

impl ReasoningGateway for IncompleteReasoningGateway {
    fn review(&self, _request: &ReviewRequest) -> Result<QualitativeReview, ReasoningError> {
        Ok(QualitativeReview {
            score: 2.0,
            feedback: "   ".to_string(),
        })
    }
}

pub(super) type MemoryService = AssessmentService<
    MemoryCatalog,
    MemoryVersionStore,
    MemoryBandStore,
    MemoryEvidenceGateway,
    StubReasoningGateway,
>;

pub(super) fn build_service() -> (
    Arc<MemoryService>,
    Arc<MemoryVersionStore>,
    Arc<MemoryEvidenceGateway>,
    Arc<StubReasoningGateway>,
) {
    let versions = Arc::new(MemoryVersionStore::default());
    let evidence = Arc::new(MemoryEvidenceGateway::default());
    let reasoning = Arc::new(StubReasoningGateway::default());
    let service = Arc::new(AssessmentService::new(
        Arc::new(MemoryCatalog::standard()),
        versions.clone(),
        Arc::new(MemoryBandStore::seeded(sample_bands())),
        evidence.clone(),
        reasoning.clone(),
    ));
    (service, versions, evidence, reasoning)
}

pub(super) fn empty_entry(seq: &str) -> AnswerEntry {
    AnswerEntry::empty(seq)
}
