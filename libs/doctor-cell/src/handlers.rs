use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::{error::AppError, RecordId};

use crate::services::doctor::DoctorService;

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let doctor_service = DoctorService::new(&state);

    let doctors = doctor_service.list_doctors().await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = RecordId::parse(&doctor_id)
        .ok_or_else(|| AppError::BadRequest("Doctor id is required".to_string()))?;

    let doctor_service = DoctorService::new(&state);
    let doctor = doctor_service.get_doctor(&doctor_id).await?;

    Ok(Json(json!(doctor)))
}
