// libs/schedule-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Local, NaiveDate};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::{error::AppError, RecordId};

use crate::models::{DayQuery, DraftRequest, NavigateRequest, WeekQuery};
use crate::services::ScheduleService;
use crate::slot::OperatingWindow;

fn clinic_today() -> NaiveDate {
    Local::now().date_naive()
}

#[axum::debug_handler]
pub async fn day_schedule(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<DayQuery>,
) -> Result<Json<Value>, AppError> {
    let date = query.date.unwrap_or_else(clinic_today);
    let doctor_id = query.doctor_id.as_deref().and_then(RecordId::parse);
    let schedule_service = ScheduleService::new(&state)?;

    let view = schedule_service.day_view(date, doctor_id).await?;

    Ok(Json(json!(view)))
}

#[axum::debug_handler]
pub async fn week_schedule(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<Value>, AppError> {
    let date = query.date.unwrap_or_else(clinic_today);
    let doctor_id = RecordId::parse(&query.doctor_id)
        .ok_or_else(|| AppError::BadRequest("doctor_id is required for the week view".to_string()))?;
    let schedule_service = ScheduleService::new(&state)?;

    let view = schedule_service.week_view(date, doctor_id).await?;

    Ok(Json(json!(view)))
}

/// Click on a grid cell. Answers 409 when the slot is not free.
#[axum::debug_handler]
pub async fn create_draft(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<DraftRequest>,
) -> Result<Json<Value>, AppError> {
    debug!(
        "Draft requested for doctor {} on {} slot {}",
        request.doctor_id, request.date, request.slot_index
    );
    let schedule_service = ScheduleService::new(&state)?;

    let draft = schedule_service
        .draft(&request.doctor_id, request.date, request.slot_index)
        .await?;

    Ok(Json(json!({
        "draft": draft,
        "durationLabel": appointment_cell::models::duration_label(draft.duration_slots),
    })))
}

#[axum::debug_handler]
pub async fn navigate(Json(request): Json<NavigateRequest>) -> Result<Json<Value>, AppError> {
    let mut view_state = request.state;
    view_state.apply(request.action, clinic_today());

    Ok(Json(json!({
        "state": view_state,
        "visibleDays": view_state.visible_days(),
    })))
}

#[axum::debug_handler]
pub async fn time_slots(State(state): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let window = OperatingWindow::from_config(&state)?;

    Ok(Json(json!({
        "labels": window.labels(),
        "slotCount": window.slot_count(),
        "slotHeight": state.slot_height_px,
    })))
}
