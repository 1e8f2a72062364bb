use chrono::NaiveDate;

use appointment_cell::models::AppointmentDraft;
use shared_models::RecordId;

use crate::models::ScheduleError;
use crate::occupancy::SlotAssignment;

/// Turns a click on an empty cell into a pre-filled creation form.
///
/// Returns `None` for occupied, continuation and conflict slots, for an index
/// past the window, and for a grid computed for another doctor or day.
pub fn slot_to_draft(
    doctor_id: &RecordId,
    day: NaiveDate,
    slot_index: usize,
    grid: &SlotAssignment,
) -> Option<AppointmentDraft> {
    draft_for_slot(doctor_id, day, slot_index, grid).ok()
}

/// Same as [`slot_to_draft`], but says why no draft was produced.
pub fn draft_for_slot(
    doctor_id: &RecordId,
    day: NaiveDate,
    slot_index: usize,
    grid: &SlotAssignment,
) -> Result<AppointmentDraft, ScheduleError> {
    if !grid.belongs_to(doctor_id, day) {
        return Err(ScheduleError::GridMismatch);
    }

    let time = grid
        .window
        .time_at(slot_index)
        .ok_or(ScheduleError::SlotOutOfRange {
            index: slot_index,
            slot_count: grid.window.slot_count(),
        })?;

    if !grid.is_free(slot_index) {
        return Err(ScheduleError::SlotOccupied { index: slot_index });
    }

    Ok(AppointmentDraft::new(doctor_id.clone(), day.and_time(time)))
}
