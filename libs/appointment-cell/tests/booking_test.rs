use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Datelike, NaiveDate, Weekday};
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

fn future_monday() -> NaiveDate {
    let mut date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    while date.weekday() != Weekday::Mon {
        date = date.succ_opt().unwrap();
    }
    date
}

/// Schedule + break + vacation + booked-slot mocks that the fresh
/// availability check performed by every booking runs against: Monday
/// 09:00-12:00 at 30 minutes, nothing booked yet.
async fn mount_open_monday(mock_server: &MockServer, doctor_id: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockClinicResponses::schedule_response(
                doctor_id,
                30,
                MockClinicResponses::default_working_days("09:00:00", "12:00:00")
            )
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_breaks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_vacations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "in.(pending,confirmed,completed)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

fn booking_body(doctor_id: &str, patient_id: &str, date: NaiveDate, start: &str) -> String {
    json!({
        "doctor_id": doctor_id,
        "patient_id": patient_id,
        "date": date,
        "start_time": start,
        "reason": "routine checkup",
        "is_teleconsultation": false
    })
    .to_string()
}

fn book_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("Authorization", "Bearer test-token")
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn booking_a_free_slot_succeeds() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();
    let date = future_monday();

    mount_open_monday(&mock_server, &doctor_id).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockClinicResponses::appointment_response(
                &doctor_id,
                &patient_id,
                &date.to_string(),
                "10:30:00",
                "11:00:00",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(test_config(&mock_server));
    let response = app
        .oneshot(book_request(booking_body(&doctor_id, &patient_id, date, "10:30:00")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["status"], json!("pending"));
    assert_eq!(body["start_time"], json!("10:30:00"));
    assert_eq!(body["end_time"], json!("11:00:00"));
}

#[tokio::test]
async fn booking_rejects_a_slot_off_the_grid() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();

    // 12:00 is past closing; no insert mock is mounted, so reaching
    // storage would fail the test.
    mount_open_monday(&mock_server, &doctor_id).await;

    let app = create_test_app(test_config(&mock_server));
    let response = app
        .oneshot(book_request(booking_body(
            &doctor_id,
            &patient_id,
            future_monday(),
            "12:00:00",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json(response).await;
    assert_eq!(body["kind"], json!("slot_unavailable"));
}

#[tokio::test]
async fn booking_rejects_an_already_taken_slot() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockClinicResponses::schedule_response(
                &doctor_id,
                30,
                MockClinicResponses::default_working_days("09:00:00", "12:00:00")
            )
        ])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_breaks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_vacations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "in.(pending,confirmed,completed)"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "start_time": "10:30:00" }])),
        )
        .mount(&mock_server)
        .await;

    let app = create_test_app(test_config(&mock_server));
    let response = app
        .oneshot(book_request(booking_body(
            &doctor_id,
            &patient_id,
            future_monday(),
            "10:30:00",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json(response).await;
    assert_eq!(body["kind"], json!("slot_unavailable"));
}

#[tokio::test]
async fn storage_conflict_surfaces_as_slot_unavailable() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();

    mount_open_monday(&mock_server, &doctor_id).await;

    // A competing booking won between the availability check and the
    // insert: the unique index answers 409.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&mock_server)
        .await;

    let app = create_test_app(test_config(&mock_server));
    let response = app
        .oneshot(book_request(booking_body(
            &doctor_id,
            &patient_id,
            future_monday(),
            "10:30:00",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json(response).await;
    // The raw storage conflict must not leak; callers only ever see the
    // slot-unavailable category.
    assert_eq!(body["kind"], json!("slot_unavailable"));
}

#[tokio::test]
async fn exactly_one_of_two_racing_bookings_wins() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();
    let patient_id_a = Uuid::new_v4().to_string();
    let patient_id_b = Uuid::new_v4().to_string();
    let date = future_monday();

    mount_open_monday(&mock_server, &doctor_id).await;

    // The storage layer admits one insert for the slot; every later
    // attempt hits the unique index.
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockClinicResponses::appointment_response(
                &doctor_id,
                &patient_id_a,
                &date.to_string(),
                "10:30:00",
                "11:00:00",
                "pending"
            )
        ])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint"
        })))
        .mount(&mock_server)
        .await;

    let app = create_test_app(test_config(&mock_server));
    let (first, second) = futures::join!(
        app.clone()
            .oneshot(book_request(booking_body(&doctor_id, &patient_id_a, date, "10:30:00"))),
        app.clone()
            .oneshot(book_request(booking_body(&doctor_id, &patient_id_b, date, "10:30:00"))),
    );

    let statuses = [first.unwrap().status(), second.unwrap().status()];
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CREATED).count(),
        1
    );
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(),
        1
    );
}

#[tokio::test]
async fn listing_returns_the_days_appointments() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();
    let date = future_monday();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("date", format!("eq.{}", date)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockClinicResponses::appointment_response(
                &doctor_id,
                &patient_id,
                &date.to_string(),
                "09:00:00",
                "09:30:00",
                "confirmed"
            ),
            MockClinicResponses::appointment_response(
                &doctor_id,
                &patient_id,
                &date.to_string(),
                "10:30:00",
                "11:00:00",
                "cancelled"
            )
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(test_config(&mock_server));
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/?doctor_id={}&date={}", doctor_id, date))
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["status"], json!("confirmed"));
    assert_eq!(rows[1]["status"], json!("cancelled"));
}
