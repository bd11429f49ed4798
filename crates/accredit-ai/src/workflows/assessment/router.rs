use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::bands::{BandError, ScoreBand};
use super::domain::{AnswerSet, Attachment, AttachmentId, AuthorId, CriterionKey, UnitId};
use super::evidence::{EvidenceGateway, EvidenceUpload};
use super::ledger::LedgerError;
use super::qualitative::ReviewError;
use super::repository::{BandStore, MatrixCatalog, ReasoningGateway, VersionStore};
use super::scoring::CountedInputs;
use super::service::{AssessmentError, AssessmentService};

/// Router builder exposing the assessment endpoints.
pub fn assessment_router<C, S, B, G, R>(
    service: Arc<AssessmentService<C, S, B, G, R>>,
) -> Router
where
    C: MatrixCatalog + 'static,
    S: VersionStore + 'static,
    B: BandStore + 'static,
    G: EvidenceGateway + 'static,
    R: ReasoningGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/assessments/:unit/:no/:sub",
            get(workspace_handler::<C, S, B, G, R>),
        )
        .route(
            "/api/v1/assessments/:unit/:no/:sub/commits",
            post(commit_handler::<C, S, B, G, R>),
        )
        .route(
            "/api/v1/assessments/:unit/:no/:sub/history",
            get(history_handler::<C, S, B, G, R>),
        )
        .route(
            "/api/v1/assessments/:unit/:no/:sub/items/:seq/evidence",
            post(evidence_handler::<C, S, B, G, R>),
        )
        .route(
            "/api/v1/evidence/:id",
            delete(evidence_delete_handler::<C, S, B, G, R>),
        )
        .route(
            "/api/v1/scores/:no/:sub/quantitative",
            post(quantitative_handler::<C, S, B, G, R>),
        )
        .route(
            "/api/v1/assessments/:unit/:no/:sub/items/:seq/review",
            post(review_handler::<C, S, B, G, R>),
        )
        .route(
            "/api/v1/score-bands",
            get(bands_handler::<C, S, B, G, R>).put(bands_save_handler::<C, S, B, G, R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkspaceQuery {
    pub(crate) reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommitRequest {
    pub(crate) answers: AnswerSet,
    pub(crate) message: String,
    pub(crate) author: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvidenceRequest {
    #[serde(default)]
    pub(crate) existing: Vec<Attachment>,
    pub(crate) files: Vec<EvidenceFilePayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvidenceFilePayload {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) content_type: Option<String>,
    pub(crate) content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuantitativeRequest {
    pub(crate) n1: f64,
    pub(crate) n2: f64,
    pub(crate) n3: f64,
    pub(crate) ndtps: f64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReviewRequestBody {
    #[serde(default)]
    pub(crate) answers: Option<AnswerSet>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BandsRequest {
    pub(crate) bands: Vec<ScoreBand>,
}

type Service<C, S, B, G, R> = Arc<AssessmentService<C, S, B, G, R>>;

pub(crate) async fn workspace_handler<C, S, B, G, R>(
    State(service): State<Service<C, S, B, G, R>>,
    Path((unit, no, sub)): Path<(String, u32, String)>,
    Query(query): Query<WorkspaceQuery>,
) -> Response
where
    C: MatrixCatalog + 'static,
    S: VersionStore + 'static,
    B: BandStore + 'static,
    G: EvidenceGateway + 'static,
    R: ReasoningGateway + 'static,
{
    let unit = UnitId(unit);
    let key = CriterionKey::new(no, sub);
    let reference = query.reference.map(UnitId);

    match service.workspace(&unit, &key, reference.as_ref()) {
        Ok(workspace) => (StatusCode::OK, axum::Json(workspace)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn commit_handler<C, S, B, G, R>(
    State(service): State<Service<C, S, B, G, R>>,
    Path((unit, no, sub)): Path<(String, u32, String)>,
    axum::Json(request): axum::Json<CommitRequest>,
) -> Response
where
    C: MatrixCatalog + 'static,
    S: VersionStore + 'static,
    B: BandStore + 'static,
    G: EvidenceGateway + 'static,
    R: ReasoningGateway + 'static,
{
    let unit = UnitId(unit);
    let key = CriterionKey::new(no, sub);
    let author = AuthorId(request.author);

    match service.commit(&unit, &key, request.answers, &request.message, &author) {
        Ok(version) => (StatusCode::CREATED, axum::Json(version)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<C, S, B, G, R>(
    State(service): State<Service<C, S, B, G, R>>,
    Path((unit, no, sub)): Path<(String, u32, String)>,
) -> Response
where
    C: MatrixCatalog + 'static,
    S: VersionStore + 'static,
    B: BandStore + 'static,
    G: EvidenceGateway + 'static,
    R: ReasoningGateway + 'static,
{
    let unit = UnitId(unit);
    let key = CriterionKey::new(no, sub);

    match service.history(&unit, &key) {
        Ok(versions) => (StatusCode::OK, axum::Json(versions)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evidence_handler<C, S, B, G, R>(
    State(service): State<Service<C, S, B, G, R>>,
    Path((unit, no, sub, seq)): Path<(String, u32, String, String)>,
    axum::Json(request): axum::Json<EvidenceRequest>,
) -> Response
where
    C: MatrixCatalog + 'static,
    S: VersionStore + 'static,
    B: BandStore + 'static,
    G: EvidenceGateway + 'static,
    R: ReasoningGateway + 'static,
{
    let unit = UnitId(unit);
    let key = CriterionKey::new(no, sub);
    let files = request
        .files
        .into_iter()
        .map(|file| EvidenceUpload {
            name: file.name,
            content_type: file.content_type,
            bytes: file.content.into_bytes(),
        })
        .collect();

    match service.attach_evidence(&unit, &key, &seq, &request.existing, files) {
        Ok(attachments) => (StatusCode::OK, axum::Json(attachments)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evidence_delete_handler<C, S, B, G, R>(
    State(service): State<Service<C, S, B, G, R>>,
    Path(id): Path<String>,
) -> Response
where
    C: MatrixCatalog + 'static,
    S: VersionStore + 'static,
    B: BandStore + 'static,
    G: EvidenceGateway + 'static,
    R: ReasoningGateway + 'static,
{
    match service.delete_evidence(&AttachmentId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn quantitative_handler<C, S, B, G, R>(
    State(service): State<Service<C, S, B, G, R>>,
    Path((no, sub)): Path<(u32, String)>,
    axum::Json(request): axum::Json<QuantitativeRequest>,
) -> Response
where
    C: MatrixCatalog + 'static,
    S: VersionStore + 'static,
    B: BandStore + 'static,
    G: EvidenceGateway + 'static,
    R: ReasoningGateway + 'static,
{
    let key = CriterionKey::new(no, sub);
    let inputs = CountedInputs {
        n1: request.n1,
        n2: request.n2,
        n3: request.n3,
        ndtps: request.ndtps,
    };

    match service.quantitative_score(&key, &inputs) {
        Ok(score) => {
            let payload = json!({ "task": key.to_string(), "score": score });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn review_handler<C, S, B, G, R>(
    State(service): State<Service<C, S, B, G, R>>,
    Path((unit, no, sub, seq)): Path<(String, u32, String, String)>,
    axum::Json(request): axum::Json<ReviewRequestBody>,
) -> Response
where
    C: MatrixCatalog + 'static,
    S: VersionStore + 'static,
    B: BandStore + 'static,
    G: EvidenceGateway + 'static,
    R: ReasoningGateway + 'static,
{
    let unit = UnitId(unit);
    let key = CriterionKey::new(no, sub);

    match service.qualitative_review(&unit, &key, &seq, request.answers) {
        Ok((answers, review)) => {
            let payload = json!({ "review": review, "answers": answers });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bands_handler<C, S, B, G, R>(
    State(service): State<Service<C, S, B, G, R>>,
) -> Response
where
    C: MatrixCatalog + 'static,
    S: VersionStore + 'static,
    B: BandStore + 'static,
    G: EvidenceGateway + 'static,
    R: ReasoningGateway + 'static,
{
    match service.score_bands() {
        Ok(bands) => (StatusCode::OK, axum::Json(bands)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bands_save_handler<C, S, B, G, R>(
    State(service): State<Service<C, S, B, G, R>>,
    axum::Json(request): axum::Json<BandsRequest>,
) -> Response
where
    C: MatrixCatalog + 'static,
    S: VersionStore + 'static,
    B: BandStore + 'static,
    G: EvidenceGateway + 'static,
    R: ReasoningGateway + 'static,
{
    match service.save_score_bands(request.bands) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AssessmentError) -> Response {
    let status = match &error {
        AssessmentError::UnknownMatrix(_) | AssessmentError::UnknownFormula(_) => {
            StatusCode::NOT_FOUND
        }
        AssessmentError::Ledger(LedgerError::UnknownSeq { .. })
        | AssessmentError::Ledger(LedgerError::DuplicateSeq(_))
        | AssessmentError::Formula(_)
        | AssessmentError::Band(BandError::Overlap { .. })
        | AssessmentError::Band(BandError::DuplicateColor(_))
        | AssessmentError::Review(ReviewError::UnknownSeq(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        AssessmentError::Evidence(_) | AssessmentError::Review(ReviewError::Upstream(_)) => {
            StatusCode::BAD_GATEWAY
        }
        AssessmentError::Ledger(LedgerError::Store(_))
        | AssessmentError::Band(BandError::Store(_))
        | AssessmentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
