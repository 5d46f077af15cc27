//! Integration tests for the HTTP service

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use tutor_agents::collaborators::StubGenerator;
use tutor_agents::metrics::PipelineMetrics;
use tutor_agents::server::{router, AppState};
use tutor_agents::{Orchestrator, ToolPlanner};

fn app() -> (Router, Arc<AppState>) {
    let metrics = PipelineMetrics::new().unwrap();
    let orchestrator = Orchestrator::new(Arc::new(StubGenerator::default()), ToolPlanner::disabled())
        .with_metrics(metrics.clone());
    let state = Arc::new(AppState::new(orchestrator, metrics));
    (router(state.clone()), state)
}

fn post_answer(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/answer")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn task_body() -> Value {
    json!({
        "message": "What is Newton's first law of motion?",
        "mode": "explain",
        "subject": "physics",
        "board": "CBSE",
        "grade": 9
    })
}

/// Test: a valid task returns a success result
#[tokio::test]
async fn test_answer_success() {
    let (app, _) = app();
    let response = app.oneshot(post_answer(task_body())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["answer"]["kind"], "final");
    assert_eq!(body["metadata"]["regeneration_count"], 0);
    assert_eq!(body["metadata"]["detected_language"], "english");
}

/// Test: an unknown mode is rejected as INVALID_INPUT with 400
#[tokio::test]
async fn test_unknown_mode_is_bad_request() {
    let (app, _) = app();
    let mut body = task_body();
    body["mode"] = json!("dance");

    let response = app.oneshot(post_answer(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["status"], "failure");
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert_eq!(body["error"]["regeneration_count"], 0);
}

/// Test: a body that is not JSON still gets a failure result with 400
#[tokio::test]
async fn test_unparseable_body_is_bad_request() {
    let (app, _) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/answer")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"message\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["status"], "failure");
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert!(!body["error"]["request_id"].as_str().unwrap().is_empty());
}

/// Test: a request without a JSON content type is rejected as INVALID_INPUT
#[tokio::test]
async fn test_missing_content_type_is_bad_request() {
    let (app, _) = app();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/answer")
        .body(Body::from(task_body().to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_INPUT");
}

/// Test: a task failing validation is rejected with 400
#[tokio::test]
async fn test_out_of_range_grade_is_bad_request() {
    let (app, _) = app();
    let mut body = task_body();
    body["grade"] = json!(0);

    let response = app.oneshot(post_answer(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_INPUT");
}

/// Test: requests carrying a session id share one stored session
#[tokio::test]
async fn test_session_id_is_stored() {
    let (app, state) = app();
    let mut body = task_body();
    body["session_id"] = json!("student-42");

    for _ in 0..2 {
        let response = app.clone().oneshot(post_answer(body.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(state.sessions.len().await, 1);
    let session = state.sessions.get_or_create("student-42").await;
    assert_eq!(session.lock().await.turns(), 2);
}

/// Test: the metrics endpoint exposes pipeline counters
#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = app();
    app.clone().oneshot(post_answer(task_body())).await.unwrap();

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("tutor_responses_total{outcome=\"ok\"} 1"));
}

/// Test: the health endpoint reports status and prompt version
#[tokio::test]
async fn test_healthz() {
    let (app, _) = app();
    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["prompt_version"], tutor_agents::prompts::PROMPT_VERSION);
    assert_eq!(body["sessions"], 0);
}
