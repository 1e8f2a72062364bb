// libs/appointment-cell/tests/handlers_test.rs

use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers::*;
use appointment_cell::models::{AppointmentRequest, AppointmentStatus, StatusUpdateRequest};
use shared_config::AppConfig;
use shared_models::{error::AppError, RecordId};
use shared_utils::test_utils::{MockClinicResponses, TestConfig};

fn config_for(server: &MockServer) -> Arc<AppConfig> {
    TestConfig::with_backend(&server.uri()).to_arc()
}

async fn mount_appointment(server: &MockServer, id: i64, status: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/appointments/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockClinicResponses::appointment_response(
            id,
            1,
            5,
            "2025-05-16T09:00:00",
            2,
            status,
        )))
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, appointments: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(appointments))
        .mount(server)
        .await;
}

fn valid_request() -> AppointmentRequest {
    AppointmentRequest {
        patient_id: Some(RecordId::Numeric(5)),
        doctor_id: Some(RecordId::Numeric(1)),
        start: Some("2025-05-16T09:30:00".to_string()),
        duration_slots: Some(2),
        status: Some(AppointmentStatus::Pending),
        notes: None,
    }
}

#[tokio::test]
async fn list_drops_malformed_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockClinicResponses::appointment_response(1, 1, 5, "2025-05-16T09:00:00", 2, "CONFIRMADA"),
            { "id": 2, "start": "2025-05-16T10:00:00" },
        ])))
        .mount(&server)
        .await;

    let body = list_appointments(State(config_for(&server))).await.unwrap().0;

    assert_eq!(body["total"], 1);
    assert_eq!(body["appointments"][0]["status"], "CONFIRMED");
    assert_eq!(body["appointments"][0]["durationSlots"], 2);
}

#[tokio::test]
async fn patient_listing_uses_patient_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appointments/patient/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockClinicResponses::appointment_response(1, 1, 5, "2025-05-16T09:00:00", 1, "PENDING"),
        ])))
        .mount(&server)
        .await;

    let body = get_patient_appointments(State(config_for(&server)), Path("5".to_string()))
        .await
        .unwrap()
        .0;

    assert_eq!(body["patientId"], 5);
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn detail_includes_presentation_fields() {
    let server = MockServer::start().await;
    mount_appointment(&server, 3, "WAITING_ROOM").await;

    let body = get_appointment(State(config_for(&server)), Path("3".to_string()))
        .await
        .unwrap()
        .0;

    assert_eq!(body["statusLabel"], "Waiting room");
    assert_eq!(body["badgeColor"], "blue");
    assert_eq!(body["durationLabel"], "1 h");
    assert_eq!(body["selectableStatuses"][0], "WAITING_ROOM");
}

#[tokio::test]
async fn create_posts_payload_with_end() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        json!([MockClinicResponses::appointment_response(3, 1, 9, "2025-05-16T08:30:00", 2, "CONFIRMED")]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/appointments"))
        .and(body_partial_json(json!({
            "start": "2025-05-16T09:30:00",
            "end": "2025-05-16T10:30:00",
            "durationSlots": 2
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(MockClinicResponses::appointment_response(
            40,
            1,
            5,
            "2025-05-16T09:30:00",
            2,
            "PENDING",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let (status, Json(body)) = create_appointment(State(config_for(&server)), Json(valid_request()))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 40);
}

#[tokio::test]
async fn create_with_invalid_form_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut request = valid_request();
    request.start = Some("2025-05-16T09:45:00".to_string());

    let result = create_appointment(State(config_for(&server)), Json(request)).await;

    assert_matches!(result, Err(AppError::InvalidFields(fields)) if fields.contains_key("start"));
}

#[tokio::test]
async fn backend_rejection_surfaces_status() {
    let server = MockServer::start().await;
    mount_listing(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(400).set_body_json(MockClinicResponses::error_response("overlap")))
        .mount(&server)
        .await;

    let result = create_appointment(State(config_for(&server)), Json(valid_request())).await;

    let err = result.unwrap_err();
    assert_matches!(err, AppError::Rejected { status: 400, .. });
    assert_eq!(err.user_message(), "The server rejected the submitted data.");
}

#[tokio::test]
async fn overlapping_booking_is_refused_before_posting() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        json!([MockClinicResponses::appointment_response(3, 1, 9, "2025-05-16T09:00:00", 2, "CONFIRMED")]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let result = create_appointment(State(config_for(&server)), Json(valid_request())).await;

    let err = result.unwrap_err();
    assert_matches!(err, AppError::Conflict(_));
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancelled_booking_does_not_block_the_slot() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        json!([MockClinicResponses::appointment_response(3, 1, 9, "2025-05-16T09:30:00", 1, "CANCELLED")]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(MockClinicResponses::appointment_response(
            41,
            1,
            5,
            "2025-05-16T09:30:00",
            2,
            "PENDING",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let (status, _) = create_appointment(State(config_for(&server)), Json(valid_request()))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn edit_without_status_keeps_current_status() {
    let server = MockServer::start().await;
    mount_appointment(&server, 9, "CONFIRMED").await;
    mount_listing(
        &server,
        json!([MockClinicResponses::appointment_response(9, 1, 5, "2025-05-16T09:00:00", 2, "CONFIRMED")]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/api/appointments/9"))
        .and(body_partial_json(json!({ "status": "CONFIRMED", "notes": "bring x-rays" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockClinicResponses::appointment_response(
            9,
            1,
            5,
            "2025-05-16T09:00:00",
            2,
            "CONFIRMED",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let request = AppointmentRequest {
        patient_id: Some(RecordId::Numeric(5)),
        doctor_id: Some(RecordId::Numeric(1)),
        start: Some("2025-05-16T09:00:00".to_string()),
        duration_slots: Some(2),
        status: None,
        notes: Some("bring x-rays".to_string()),
    };

    let body = update_appointment(State(config_for(&server)), Path("9".to_string()), Json(request))
        .await
        .unwrap()
        .0;

    assert_eq!(body["status"], "CONFIRMED");
}

#[tokio::test]
async fn status_change_respects_policy() {
    let server = MockServer::start().await;
    mount_appointment(&server, 7, "CANCELLED").await;
    Mock::given(method("PUT"))
        .and(path("/api/appointments/7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = update_appointment_status(
        State(config_for(&server)),
        Path("7".to_string()),
        Json(StatusUpdateRequest { status: AppointmentStatus::InProgress }),
    )
    .await;

    assert_matches!(result, Err(AppError::Conflict(_)));
}

#[tokio::test]
async fn allowed_status_change_is_sent() {
    let server = MockServer::start().await;
    mount_appointment(&server, 8, "PENDING").await;
    Mock::given(method("PUT"))
        .and(path("/api/appointments/8"))
        .and(body_partial_json(json!({ "status": "CONFIRMED" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockClinicResponses::appointment_response(
            8,
            1,
            5,
            "2025-05-16T09:00:00",
            2,
            "CONFIRMED",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let body = update_appointment_status(
        State(config_for(&server)),
        Path("8".to_string()),
        Json(StatusUpdateRequest { status: AppointmentStatus::Confirmed }),
    )
    .await
    .unwrap()
    .0;

    assert_eq!(body["status"], "CONFIRMED");
}

#[tokio::test]
async fn delete_missing_appointment_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/appointments/99"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = delete_appointment(State(config_for(&server)), Path("99".to_string())).await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn delete_returns_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/appointments/12"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let status = delete_appointment(State(config_for(&server)), Path("12".to_string()))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::NO_CONTENT);
}
