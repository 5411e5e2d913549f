use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{MockClinicResponses, TestConfig};

fn create_test_app(config: AppConfig) -> Router {
    appointment_routes(Arc::new(config))
}

fn test_config(mock_server: &MockServer) -> AppConfig {
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = mock_server.uri();
    config
}

fn appointment_row(id: &Uuid, status: &str) -> Value {
    let mut row = MockClinicResponses::appointment_response(
        &Uuid::new_v4().to_string(),
        &Uuid::new_v4().to_string(),
        "2030-01-07",
        "10:30:00",
        "11:00:00",
        status,
    );
    row["id"] = json!(id);
    row
}

async fn mount_current(mock_server: &MockServer, id: &Uuid, status: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment_row(id, status)])))
        .mount(mock_server)
        .await;
}

fn status_request(id: &Uuid, new_status: &str) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(format!("/{}/status", id))
        .header("Authorization", "Bearer test-token")
        .header("Content-Type", "application/json")
        .body(Body::from(json!({ "status": new_status }).to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn confirming_a_pending_appointment_succeeds() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    mount_current(&mock_server, &id, "pending").await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([appointment_row(&id, "confirmed")])),
        )
        .mount(&mock_server)
        .await;

    let app = create_test_app(test_config(&mock_server));
    let response = app.oneshot(status_request(&id, "confirmed")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], json!("confirmed"));
}

#[tokio::test]
async fn completing_a_confirmed_appointment_succeeds() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    mount_current(&mock_server, &id, "confirmed").await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([appointment_row(&id, "completed")])),
        )
        .mount(&mock_server)
        .await;

    let app = create_test_app(test_config(&mock_server));
    let response = app.oneshot(status_request(&id, "completed")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], json!("completed"));
}

#[tokio::test]
async fn re_confirming_a_completed_appointment_fails() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    // No PATCH mock: an illegal transition must never reach storage.
    mount_current(&mock_server, &id, "completed").await;

    let app = create_test_app(test_config(&mock_server));
    let response = app.oneshot(status_request(&id, "confirmed")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json(response).await;
    assert_eq!(body["kind"], json!("invalid_transition"));
}

#[tokio::test]
async fn pending_cannot_jump_straight_to_completed() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    mount_current(&mock_server, &id, "pending").await;

    let app = create_test_app(test_config(&mock_server));
    let response = app.oneshot(status_request(&id, "completed")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn cancelling_a_cancelled_appointment_fails() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    mount_current(&mock_server, &id, "cancelled").await;

    let app = create_test_app(test_config(&mock_server));
    let response = app.oneshot(status_request(&id, "cancelled")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_appointment_is_a_404() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(test_config(&mock_server));
    let response = app.oneshot(status_request(&id, "confirmed")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["kind"], json!("not_found"));
}
