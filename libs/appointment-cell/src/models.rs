// libs/appointment-cell/src/models.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use shared_models::{error::AppError, RecordId};

use crate::wall_clock;

/// Length of one grid slot.
pub const SLOT_MINUTES: i64 = 30;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: RecordId,
    pub doctor_id: RecordId,
    pub patient_id: Option<RecordId>,
    #[serde(with = "wall_clock")]
    pub start: NaiveDateTime,
    pub duration_slots: u32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub treatment: Option<String>,
}

impl Appointment {
    /// Exclusive end of the occupied interval.
    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(SLOT_MINUTES * self.duration_slots as i64)
    }

    pub fn day(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start.time()
    }

    /// Half-open interval overlap with another appointment of the same doctor.
    pub fn overlaps(&self, other: &Appointment) -> bool {
        self.doctor_id == other.doctor_id && self.start < other.end() && other.start < self.end()
    }

    pub fn occupies_slots(&self) -> bool {
        self.status.is_active()
    }

    pub fn duration_label(&self) -> String {
        duration_label(self.duration_slots)
    }
}

/// Human-readable length of `slots` half-hour slots ("30 min", "1 h 30 min").
pub fn duration_label(slots: u32) -> String {
    let minutes = slots as i64 * SLOT_MINUTES;
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{} min", m),
        (h, 0) => format!("{} h", h),
        (h, m) => format!("{} h {} min", h, m),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    #[serde(alias = "PENDIENTE", alias = "pending")]
    Pending,
    #[serde(alias = "CONFIRMADA", alias = "confirmed")]
    Confirmed,
    #[serde(alias = "SALA_ESPERA", alias = "waiting_room")]
    WaitingRoom,
    #[serde(alias = "EN_CURSO", alias = "in_progress")]
    InProgress,
    #[serde(alias = "COMPLETADA", alias = "completed")]
    Completed,
    #[serde(alias = "CANCELADA", alias = "cancelled")]
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::WaitingRoom,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::WaitingRoom => "Waiting room",
            AppointmentStatus::InProgress => "In progress",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
        }
    }

    pub fn badge_color(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "yellow",
            AppointmentStatus::Confirmed => "green",
            AppointmentStatus::WaitingRoom => "blue",
            AppointmentStatus::InProgress => "purple",
            AppointmentStatus::Completed => "gray",
            AppointmentStatus::Cancelled => "red",
        }
    }

    /// Cancelled appointments release their slots.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "PENDING"),
            AppointmentStatus::Confirmed => write!(f, "CONFIRMED"),
            AppointmentStatus::WaitingRoom => write!(f, "WAITING_ROOM"),
            AppointmentStatus::InProgress => write!(f, "IN_PROGRESS"),
            AppointmentStatus::Completed => write!(f, "COMPLETED"),
            AppointmentStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ==============================================================================
// INGESTION
// ==============================================================================

/// Appointment record as it arrives from the backend, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAppointment {
    pub id: Option<RecordId>,
    pub doctor_id: Option<RecordId>,
    pub patient_id: Option<RecordId>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub duration_slots: Option<i64>,
    pub status: Option<Value>,
    pub notes: Option<String>,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub treatment: Option<String>,
}

impl RawAppointment {
    pub fn into_appointment(self) -> Result<Appointment, AppointmentError> {
        let id = self
            .id
            .filter(|id| !id.is_blank())
            .ok_or_else(|| AppointmentError::Malformed("missing id".to_string()))?;

        let doctor_id = self
            .doctor_id
            .filter(|id| !id.is_blank())
            .ok_or_else(|| AppointmentError::Malformed(format!("appointment {} has no doctorId", id)))?;

        let start = self
            .start
            .as_deref()
            .and_then(wall_clock::parse)
            .ok_or_else(|| AppointmentError::Malformed(format!("appointment {} has no valid start", id)))?;

        let duration_slots = match (self.duration_slots, self.end.as_deref().and_then(wall_clock::parse)) {
            (Some(slots), _) => u32::try_from(slots)
                .ok()
                .filter(|&slots| slots >= 1)
                .ok_or_else(|| {
                    AppointmentError::Malformed(format!("appointment {} has durationSlots {}", id, slots))
                })?,
            // Derive from the end timestamp, rounding partial slots up.
            (None, Some(end)) if end > start => {
                let minutes = (end - start).num_minutes();
                u32::try_from(((minutes + SLOT_MINUTES - 1) / SLOT_MINUTES).max(1)).map_err(|_| {
                    AppointmentError::Malformed(format!("appointment {} ends too far after its start", id))
                })?
            }
            (None, _) => 1,
        };

        let status = match self.status {
            None | Some(Value::Null) => AppointmentStatus::Pending,
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|_| {
                warn!("Appointment {} has unknown status {}, treating as PENDING", id, value);
                AppointmentStatus::Pending
            }),
        };

        Ok(Appointment {
            id,
            doctor_id,
            patient_id: self.patient_id.filter(|id| !id.is_blank()),
            start,
            duration_slots,
            status,
            notes: self.notes,
            patient_name: self.patient_name,
            doctor_name: self.doctor_name,
            treatment: self.treatment,
        })
    }
}

/// Validates a backend list once. Malformed records are logged and left out.
pub fn ingest_appointments(raw: Vec<RawAppointment>) -> Vec<Appointment> {
    raw.into_iter()
        .filter_map(|record| match record.into_appointment() {
            Ok(appointment) => Some(appointment),
            Err(e) => {
                warn!("Rejected appointment record: {}", e);
                None
            }
        })
        .collect()
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Appointment form contents, as posted by the UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    pub patient_id: Option<RecordId>,
    pub doctor_id: Option<RecordId>,
    pub start: Option<String>,
    pub duration_slots: Option<i64>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
}

/// An [`AppointmentRequest`] that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAppointmentRequest {
    pub patient_id: RecordId,
    pub doctor_id: RecordId,
    pub start: NaiveDateTime,
    pub duration_slots: u32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

impl AppointmentRequest {
    pub fn validate(&self) -> Result<ValidAppointmentRequest, AppointmentError> {
        let mut errors = BTreeMap::new();

        let patient_id = self.patient_id.clone().filter(|id| !id.is_blank());
        if patient_id.is_none() {
            errors.insert("patientId".to_string(), "Patient is required".to_string());
        }

        let doctor_id = self.doctor_id.clone().filter(|id| !id.is_blank());
        if doctor_id.is_none() {
            errors.insert("doctorId".to_string(), "Doctor is required".to_string());
        }

        let start = match self.start.as_deref() {
            None => {
                errors.insert("start".to_string(), "Date and time are required".to_string());
                None
            }
            Some(raw) => match wall_clock::parse(raw) {
                None => {
                    errors.insert("start".to_string(), format!("'{}' is not a valid date and time", raw));
                    None
                }
                Some(start) if start.minute() % 30 != 0 || start.second() != 0 => {
                    errors.insert("start".to_string(), "Time must be on the hour or half hour".to_string());
                    None
                }
                Some(start) => Some(start),
            },
        };

        let duration_slots = match self.duration_slots {
            None => 1,
            Some(slots) if slots < 1 => {
                errors.insert("durationSlots".to_string(), "Duration must be at least one slot".to_string());
                0
            }
            Some(slots) => u32::try_from(slots).unwrap_or_else(|_| {
                errors.insert("durationSlots".to_string(), "Duration is too long".to_string());
                0
            }),
        };

        match (patient_id, doctor_id, start) {
            (Some(patient_id), Some(doctor_id), Some(start)) if errors.is_empty() => Ok(ValidAppointmentRequest {
                patient_id,
                doctor_id,
                start,
                duration_slots,
                status: self.status.unwrap_or(AppointmentStatus::Pending),
                notes: self.notes.clone().filter(|n| !n.trim().is_empty()),
            }),
            _ => Err(AppointmentError::InvalidFields(errors)),
        }
    }
}

impl ValidAppointmentRequest {
    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(SLOT_MINUTES * self.duration_slots as i64)
    }

    /// First active appointment of the same doctor this request would overlap.
    /// A cancelled request overlaps nothing.
    pub fn first_overlap<'a>(
        &self,
        existing: &'a [Appointment],
        ignore: Option<&RecordId>,
    ) -> Option<&'a Appointment> {
        if !self.status.is_active() {
            return None;
        }
        let end = self.end();
        existing.iter().find(|a| {
            Some(&a.id) != ignore
                && a.occupies_slots()
                && a.doctor_id == self.doctor_id
                && a.start < end
                && self.start < a.end()
        })
    }

    /// Body sent to the backend; `end` is derived from the duration.
    pub fn to_payload(&self) -> Value {
        json!({
            "patientId": self.patient_id,
            "doctorId": self.doctor_id,
            "start": wall_clock::format(&self.start),
            "end": wall_clock::format(&self.end()),
            "durationSlots": self.duration_slots,
            "status": self.status,
            "notes": self.notes,
        })
    }
}

impl From<&Appointment> for AppointmentRequest {
    fn from(appointment: &Appointment) -> Self {
        Self {
            patient_id: appointment.patient_id.clone(),
            doctor_id: Some(appointment.doctor_id.clone()),
            start: Some(wall_clock::format(&appointment.start)),
            duration_slots: Some(appointment.duration_slots as i64),
            status: Some(appointment.status),
            notes: appointment.notes.clone(),
        }
    }
}

/// Pre-filled creation form produced by clicking an empty grid slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    pub doctor_id: RecordId,
    #[serde(with = "wall_clock")]
    pub start: NaiveDateTime,
    pub duration_slots: u32,
    pub status: AppointmentStatus,
}

impl AppointmentDraft {
    pub fn new(doctor_id: RecordId, start: NaiveDateTime) -> Self {
        Self {
            doctor_id,
            start,
            duration_slots: 1,
            status: AppointmentStatus::Pending,
        }
    }

    pub fn to_request(&self, patient_id: Option<RecordId>) -> AppointmentRequest {
        AppointmentRequest {
            patient_id,
            doctor_id: Some(self.doctor_id.clone()),
            start: Some(wall_clock::format(&self.start)),
            duration_slots: Some(self.duration_slots as i64),
            status: Some(self.status),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: AppointmentStatus,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Malformed appointment record: {0}")]
    Malformed(String),

    #[error("Invalid appointment fields")]
    InvalidFields(BTreeMap<String, String>),

    #[error("Status cannot change from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Requested time overlaps appointment {0}")]
    Overlap(RecordId),

    #[error(transparent)]
    Api(AppError),
}

impl AppointmentError {
    pub fn from_api(err: AppError) -> Self {
        match err {
            AppError::Rejected { status: 404, .. } => AppointmentError::NotFound,
            other => AppointmentError::Api(other),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::Malformed(msg) => AppError::Internal(msg),
            AppointmentError::InvalidFields(fields) => AppError::InvalidFields(fields),
            e @ (AppointmentError::InvalidStatusTransition { .. } | AppointmentError::Overlap(_)) => {
                AppError::Conflict(e.to_string())
            }
            AppointmentError::Api(inner) => inner,
        }
    }
}
