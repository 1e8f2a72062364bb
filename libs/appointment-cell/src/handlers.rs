// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::{error::AppError, RecordId};

use crate::models::{AppointmentRequest, StatusUpdateRequest};
use crate::services::{AppointmentLifecycleService, AppointmentService};

fn parse_id(raw: &str, what: &str) -> Result<RecordId, AppError> {
    RecordId::parse(raw).ok_or_else(|| AppError::BadRequest(format!("{} id is required", what)))
}

// ==============================================================================
// LISTINGS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let appointment_service = AppointmentService::new(&state);

    let appointments = appointment_service.list_appointments().await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_patient_appointments(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let patient_id = parse_id(&patient_id, "Patient")?;
    let appointment_service = AppointmentService::new(&state);

    let appointments = appointment_service.list_for_patient(&patient_id).await?;

    Ok(Json(json!({
        "patientId": patient_id,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_id(&appointment_id, "Appointment")?;
    let appointment_service = AppointmentService::new(&state);
    let lifecycle = AppointmentLifecycleService::new();

    let appointment = appointment_service.get_appointment(&appointment_id).await?;

    Ok(Json(json!({
        "appointment": appointment,
        "statusLabel": appointment.status.label(),
        "badgeColor": appointment.status.badge_color(),
        "durationLabel": appointment.duration_label(),
        "selectableStatuses": lifecycle.selectable_statuses(&appointment.status),
    })))
}

// ==============================================================================
// MUTATIONS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<AppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment_service = AppointmentService::new(&state);

    let appointment = appointment_service.create_appointment(&request).await?;

    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<AppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_id(&appointment_id, "Appointment")?;
    let appointment_service = AppointmentService::new(&state);

    let appointment = appointment_service
        .update_appointment(&appointment_id, &request)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment_id = parse_id(&appointment_id, "Appointment")?;
    let appointment_service = AppointmentService::new(&state);

    let appointment = appointment_service
        .update_status(&appointment_id, request.status)
        .await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let appointment_id = parse_id(&appointment_id, "Appointment")?;
    let appointment_service = AppointmentService::new(&state);

    appointment_service.delete_appointment(&appointment_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
