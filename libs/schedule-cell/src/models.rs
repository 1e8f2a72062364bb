use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appointment_cell::models::Appointment;
use doctor_cell::models::Doctor;
use shared_config::AppConfig;
use shared_models::{error::AppError, RecordId};

use crate::closed::{closed_blocks, ClosedBlock};
use crate::occupancy::{SlotAssignment, SlotConflict, SlotDescriptor, UnplacedAppointment};
use crate::slot::SlotLabel;
use crate::span::BlockSpan;
use crate::view_state::{NavigationAction, ScheduleViewState};

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("Invalid operating window: {0}")]
    InvalidWindow(String),

    #[error("Unknown doctor {0}")]
    UnknownDoctor(RecordId),

    #[error("Slot {index} is outside the operating window ({slot_count} slots)")]
    SlotOutOfRange { index: usize, slot_count: usize },

    #[error("Slot {index} is already taken")]
    SlotOccupied { index: usize },

    #[error("Requested time overlaps appointment {0}")]
    Overlap(RecordId),

    #[error("Grid belongs to another doctor or day")]
    GridMismatch,

    #[error("Week view needs a selected doctor")]
    NoDoctorSelected,

    #[error(transparent)]
    Source(AppError),
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::InvalidWindow(msg) => AppError::Internal(msg),
            ScheduleError::UnknownDoctor(id) => AppError::NotFound(format!("Doctor {} not found", id)),
            e @ ScheduleError::SlotOutOfRange { .. } => AppError::BadRequest(e.to_string()),
            e @ (ScheduleError::GridMismatch | ScheduleError::NoDoctorSelected) => {
                AppError::BadRequest(e.to_string())
            }
            e @ (ScheduleError::SlotOccupied { .. } | ScheduleError::Overlap(_)) => {
                AppError::Conflict(e.to_string())
            }
            ScheduleError::Source(inner) => inner,
        }
    }
}

impl From<AppError> for ScheduleError {
    fn from(err: AppError) -> Self {
        ScheduleError::Source(err)
    }
}

// ==============================================================================
// PRESENTATION
// ==============================================================================

/// Presentation constants supplied by the caller, never derived from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLayout {
    pub slot_height: u32,
    pub break_time: Option<NaiveTime>,
    pub unavailable_from: Option<NaiveTime>,
}

impl GridLayout {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            slot_height: config.slot_height_px,
            break_time: config.break_time,
            unavailable_from: config.unavailable_from,
        }
    }
}

/// A start-of-block placed on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedBlock {
    pub appointment: Appointment,
    pub position: BlockSpan,
    pub start_label: String,
    pub end_label: String,
    pub status_label: &'static str,
    pub badge_color: &'static str,
    /// Cancelled: drawn, but the slots underneath are bookable.
    pub released: bool,
}

/// One rendered column: a doctor on a day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    pub doctor: Doctor,
    pub date: NaiveDate,
    pub appointment_count: usize,
    pub slots: Vec<SlotDescriptor>,
    pub blocks: Vec<PositionedBlock>,
    pub closed: Vec<ClosedBlock>,
    pub conflicts: Vec<SlotConflict>,
    pub unplaced: Vec<UnplacedAppointment>,
}

impl ColumnView {
    pub fn build(doctor: Doctor, grid: SlotAssignment, layout: &GridLayout) -> Self {
        let blocks = grid
            .blocks(layout.slot_height)
            .into_iter()
            .map(|(appointment, position)| PositionedBlock {
                start_label: appointment.start.format("%H:%M").to_string(),
                end_label: appointment.end().format("%H:%M").to_string(),
                status_label: appointment.status.label(),
                badge_color: appointment.status.badge_color(),
                released: !appointment.occupies_slots(),
                appointment,
                position,
            })
            .collect();
        let closed = closed_blocks(&grid, layout.unavailable_from, layout.break_time, layout.slot_height);

        Self {
            doctor,
            date: grid.day,
            appointment_count: grid.placed_appointment_count(),
            slots: grid.slots,
            blocks,
            closed,
            conflicts: grid.conflicts,
            unplaced: grid.unplaced,
        }
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayScheduleView {
    pub date: NaiveDate,
    pub labels: Vec<SlotLabel>,
    pub layout: GridLayout,
    pub total_height: u32,
    pub columns: Vec<ColumnView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekScheduleView {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub doctor: Doctor,
    pub labels: Vec<SlotLabel>,
    pub layout: GridLayout,
    pub total_height: u32,
    pub days: Vec<ColumnView>,
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
    pub doctor_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeekQuery {
    pub date: Option<NaiveDate>,
    pub doctor_id: String,
}

/// Click on a grid cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    pub doctor_id: RecordId,
    pub date: NaiveDate,
    pub slot_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateRequest {
    pub state: ScheduleViewState,
    pub action: NavigationAction,
}
