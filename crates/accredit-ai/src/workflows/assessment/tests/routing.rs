use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::assessment::router::{
    self, assessment_router, CommitRequest, ReviewRequestBody, WorkspaceQuery,
};
use crate::workflows::assessment::service::AssessmentService;

async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[tokio::test]
async fn workspace_handler_synthesizes_defaults_for_fresh_units() {
    let (service, _, _, _) = build_service();

    let response = router::workspace_handler::<
        MemoryCatalog,
        MemoryVersionStore,
        MemoryBandStore,
        MemoryEvidenceGateway,
        StubReasoningGateway,
    >(
        State(service),
        Path(("informatics".to_string(), 9, "A".to_string())),
        Query(WorkspaceQuery { reference: None }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert!(body["version"].is_null());
    assert_eq!(body["answers"]["entries"].as_array().expect("entries").len(), 2);
    assert_eq!(body["bands"].as_array().expect("bands").len(), 3);
}

#[tokio::test]
async fn workspace_handler_reports_unknown_matrix() {
    let (service, _, _, _) = build_service();

    let response = router::workspace_handler::<
        MemoryCatalog,
        MemoryVersionStore,
        MemoryBandStore,
        MemoryEvidenceGateway,
        StubReasoningGateway,
    >(
        State(service),
        Path(("informatics".to_string(), 1, "Z".to_string())),
        Query(WorkspaceQuery { reference: None }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn commit_handler_rejects_unknown_seq() {
    let (service, _, _, _) = build_service();

    let mut answers = sample_matrix().default_answer_set();
    answers.entries.push(empty_entry("99"));

    let response = router::commit_handler::<
        MemoryCatalog,
        MemoryVersionStore,
        MemoryBandStore,
        MemoryEvidenceGateway,
        StubReasoningGateway,
    >(
        State(service),
        Path(("informatics".to_string(), 9, "A".to_string())),
        axum::Json(CommitRequest {
            answers,
            message: "bad".to_string(),
            author: "reviewer-1".to_string(),
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn review_handler_maps_upstream_failures_to_bad_gateway() {
    let service = Arc::new(AssessmentService::new(
        Arc::new(MemoryCatalog::standard()),
        Arc::new(MemoryVersionStore::default()),
        Arc::new(MemoryBandStore::seeded(sample_bands())),
        Arc::new(MemoryEvidenceGateway::default()),
        Arc::new(FailingReasoningGateway),
    ));

    let response = router::review_handler::<
        MemoryCatalog,
        MemoryVersionStore,
        MemoryBandStore,
        MemoryEvidenceGateway,
        FailingReasoningGateway,
    >(
        State(service),
        Path(("informatics".to_string(), 9, "A".to_string(), "3".to_string())),
        axum::Json(ReviewRequestBody::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn commit_and_history_routes_round_trip() {
    let (service, _, _, _) = build_service();
    let router = assessment_router(service);

    let commit_payload = json!({
        "answers": answers_with("3", "first"),
        "message": "initial",
        "author": "reviewer-1",
    });
    let response = router
        .clone()
        .oneshot(
            axum::http::Request::post("/api/v1/assessments/informatics/9/A/commits")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&commit_payload).expect("serialize"),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let commit_payload = json!({
        "answers": answers_with("3", "second"),
        "message": "revision",
        "author": "reviewer-1",
    });
    let response = router
        .clone()
        .oneshot(
            axum::http::Request::post("/api/v1/assessments/informatics/9/A/commits")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&commit_payload).expect("serialize"),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/assessments/informatics/9/A/history")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    let history = body.as_array().expect("history array");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["message"], "revision");
    assert_eq!(history[1]["message"], "initial");
}

#[tokio::test]
async fn quantitative_route_returns_the_capped_score() {
    let (service, _, _, _) = build_service();
    let router = assessment_router(service);

    let payload = json!({ "n1": 2.0, "n2": 1.0, "n3": 1.0, "ndtps": 10.0 });
    let response = router
        .oneshot(
            axum::http::Request::post("/api/v1/scores/9/A/quantitative")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&payload).expect("serialize"),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["task"], "9A");
    assert_eq!(body["score"], 4.0);
}

#[tokio::test]
async fn bands_routes_expose_validation_failures() {
    let (service, _, _, _) = build_service();
    let router = assessment_router(service);

    let overlapping = json!({
        "bands": [
            { "color": "red", "range_start": 0.0, "range_end": 2.0 },
            { "color": "green", "range_start": 1.0, "range_end": 3.0 },
        ]
    });
    let response = router
        .clone()
        .oneshot(
            axum::http::Request::put("/api/v1/score-bands")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&overlapping).expect("serialize"),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("overlapping"));

    // The persisted set is untouched and still served.
    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/score-bands")
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().expect("bands").len(), 3);
}

#[tokio::test]
async fn evidence_routes_upload_and_delete() {
    let (service, _, evidence, _) = build_service();
    let router = assessment_router(service);

    let payload = json!({
        "files": [
            { "name": "report.pdf", "content_type": "application/pdf", "content": "evidence" }
        ]
    });
    let response = router
        .clone()
        .oneshot(
            axum::http::Request::post("/api/v1/assessments/informatics/9/A/items/3/evidence")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    serde_json::to_vec(&payload).expect("serialize"),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let attachments = body.as_array().expect("attachments");
    assert_eq!(attachments.len(), 1);
    let id = attachments[0]["id"].as_str().expect("attachment id").to_string();

    let response = router
        .oneshot(
            axum::http::Request::delete(format!("/api/v1/evidence/{id}"))
                .body(axum::body::Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(evidence.deleted().len(), 1);
}
