use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use accredit_ai::workflows::assessment::{
    AssessmentService, Attachment, AttachmentId, BandStore, ConditionalFormula, CountedInputs,
    CriterionKey, EvidenceError, EvidenceGateway, EvidenceUpload, FormulaParameters, FormulaSpec,
    MatrixCatalog, MatrixDefinition, NewVersion, QualitativeReview, ReasoningError,
    ReasoningGateway, ReviewRequest, ScoreBand, StoreError, UnitId, Version, VersionId,
    VersionStore,
};
use accredit_ai::workflows::template::MatrixTemplateImporter;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Convenience alias for the fully wired in-memory service.
pub(crate) type ApiService = AssessmentService<
    InMemoryMatrixCatalog,
    InMemoryVersionStore,
    InMemoryBandStore,
    InMemoryEvidenceGateway,
    HeuristicReasoningGateway,
>;

pub(crate) fn build_service() -> Arc<ApiService> {
    Arc::new(AssessmentService::new(
        Arc::new(InMemoryMatrixCatalog::standard()),
        Arc::new(InMemoryVersionStore::default()),
        Arc::new(InMemoryBandStore::with_defaults()),
        Arc::new(InMemoryEvidenceGateway::default()),
        Arc::new(HeuristicReasoningGateway),
    ))
}

#[derive(Default)]
pub(crate) struct InMemoryVersionStore {
    versions: Mutex<Vec<Version>>,
    sequence: AtomicU64,
}

impl VersionStore for InMemoryVersionStore {
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

pub(crate) struct InMemoryBandStore {
    bands: Mutex<Vec<ScoreBand>>,
}

impl InMemoryBandStore {
    pub(crate) fn with_defaults() -> Self {
        Self {
            bands: Mutex::new(default_score_bands()),
        }
    }
}

impl BandStore for InMemoryBandStore {
    fn load(&self) -> Result<Vec<ScoreBand>, StoreError> {
        Ok(self.bands.lock().expect("band mutex poisoned").clone())
    }

    fn replace(&self, bands: Vec<ScoreBand>) -> Result<(), StoreError> {
        *self.bands.lock().expect("band mutex poisoned") = bands;
        Ok(())
    }
}

pub(crate) fn default_score_bands() -> Vec<ScoreBand> {
    vec![
        ScoreBand::new("red", 0.0, 2.0),
        ScoreBand::new("yellow", 2.0, 3.0),
        ScoreBand::new("green", 3.0, 4.01),
    ]
}

/// Matrix template for the lecturer-adequacy criterion, in the spreadsheet
/// layout the importer understands. Seeds the demo catalog.
pub(crate) const LECTURER_TEMPLATE: &str = "Seq,Type,Reference\n\
1,Guidance,Describe the adequacy of full-time teaching staff for the program.\n\
2,Indicator,Ratio of course sections taught by qualified full-time staff.\n\
3,Criterion,\n\
3,Score 4,Every core course is covered by qualified full-time staff.\n\
3,Score 2,Core courses rely substantially on adjunct coverage.\n\
4,Criterion,\n";

pub(crate) struct InMemoryMatrixCatalog {
    definitions: HashMap<CriterionKey, MatrixDefinition>,
    formulas: HashMap<CriterionKey, FormulaSpec>,
}

impl InMemoryMatrixCatalog {
    pub(crate) fn standard() -> Self {
        let key = standard_key();
        let matrix = MatrixTemplateImporter::from_reader(Cursor::new(LECTURER_TEMPLATE), key.clone())
            .expect("embedded template is well formed");

        let mut definitions = HashMap::new();
        definitions.insert(key.clone(), matrix);
        let mut formulas = HashMap::new();
        formulas.insert(key, standard_formula());

        Self {
            definitions,
            formulas,
        }
    }
}

impl MatrixCatalog for InMemoryMatrixCatalog {
    fn definition(&self, key: &CriterionKey) -> Result<Option<MatrixDefinition>, StoreError> {
        Ok(self.definitions.get(key).cloned())
    }

    fn formula(&self, key: &CriterionKey) -> Result<Option<FormulaSpec>, StoreError> {
        Ok(self.formulas.get(key).cloned())
    }
}

pub(crate) fn standard_key() -> CriterionKey {
    CriterionKey::new(9, "A")
}

pub(crate) fn standard_formula() -> FormulaSpec {
    FormulaSpec {
        main: "RK = a*N1 + b*N2 + c*N3 / NDTPS".to_string(),
        parameters: FormulaParameters::default(),
        conditions: vec![ConditionalFormula {
            when: "NDTPS == 0".to_string(),
            then: "0".to_string(),
        }],
    }
}

pub(crate) fn standard_inputs() -> CountedInputs {
    CountedInputs {
        n1: 2.0,
        n2: 1.0,
        n3: 1.0,
        ndtps: 10.0,
    }
}

#[derive(Debug, Default)]
pub(crate) struct InMemoryEvidenceGateway {
    sequence: AtomicU64,
    deleted: Mutex<Vec<AttachmentId>>,
}

impl InMemoryEvidenceGateway {
    pub(crate) fn deleted(&self) -> Vec<AttachmentId> {
        self.deleted.lock().expect("delete mutex poisoned").clone()
    }
}

impl EvidenceGateway for InMemoryEvidenceGateway {
    fn upload(
        &self,
        unit: &UnitId,
        task: &CriterionKey,
        seq: &str,
        files: Vec<EvidenceUpload>,
    ) -> Result<Vec<Attachment>, EvidenceError> {
        let mut attachments = Vec::with_capacity(files.len());
        for file in files {
            let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
            let content_type = file
                .content_type
                .unwrap_or_else(|| guess_content_type(&file.name));
            attachments.push(Attachment {
                id: Some(AttachmentId(format!("ev-{id:06}"))),
                name: file.name,
                url: format!(
                    "memory://evidence/{unit}/{task}/{seq}/ev-{id:06}?type={content_type}"
                ),
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

pub(crate) fn guess_content_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Local stand-in for the external reasoning service: scores by how much of
/// the rubric the answer substantiates. Deployments swap this adapter for
/// the real gateway without touching the workflow code.
#[derive(Debug)]
pub(crate) struct HeuristicReasoningGateway;

impl ReasoningGateway for HeuristicReasoningGateway {
    fn review(&self, request: &ReviewRequest) -> Result<QualitativeReview, ReasoningError> {
        let answer = request.answer.trim();
        if answer.is_empty() {
            return Ok(QualitativeReview {
                score: 0.0,
                feedback: "No answer text was provided for this criterion.".to_string(),
            });
        }

        let words = answer.split_whitespace().count() as f64;
        let score = (words / 40.0).min(1.0) * 3.0 + 1.0;
        Ok(QualitativeReview {
            score: (score * 100.0).round() / 100.0,
            feedback: format!(
                "Answer covers the criterion in {} words against {} rubric rows; \
                 verify the cited evidence before the site visit.",
                words as u64,
                request.rubric.len()
            ),
        })
    }
}
