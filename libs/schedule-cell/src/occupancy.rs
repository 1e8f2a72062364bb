//! Occupancy resolution: which appointment holds which slot of a doctor's day.
//!
//! Every slot gets exactly one [`SlotDescriptor`]. Overlapping claims never
//! overwrite each other; the slot becomes a [`SlotDescriptor::Conflict`] naming
//! every claimant and the overlap is logged. Cancelled appointments are still
//! placed and drawn, but claim no slot.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use appointment_cell::models::Appointment;
use shared_models::RecordId;

use crate::slot::OperatingWindow;
use crate::span::{block_span, BlockSpan};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SlotDescriptor {
    Empty,
    /// First slot of a block; `span` is the rendered length in slots.
    Start { appointment: Appointment, span: usize },
    Continuation { appointment_id: RecordId, start_index: usize },
    Conflict { appointment_ids: Vec<RecordId> },
}

impl SlotDescriptor {
    pub fn is_empty(&self) -> bool {
        matches!(self, SlotDescriptor::Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotConflict {
    pub slot_index: usize,
    pub time: String,
    pub appointment_ids: Vec<RecordId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnplacedReason {
    /// Starts before opening or after the last slot.
    OutsideWindow,
    /// Starts inside the window but not on a slot boundary.
    Misaligned,
    /// Placed, but clipped at the end of the window.
    Truncated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnplacedAppointment {
    pub appointment_id: RecordId,
    pub reason: UnplacedReason,
}

/// An appointment laid onto the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub appointment: Appointment,
    pub start_index: usize,
    pub span: usize,
    /// Drawn but not holding its slots (cancelled).
    pub released: bool,
}

/// Resolved grid for one doctor on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
    pub doctor_id: RecordId,
    pub day: NaiveDate,
    pub window: OperatingWindow,
    pub slots: Vec<SlotDescriptor>,
    pub placements: Vec<Placement>,
    pub conflicts: Vec<SlotConflict>,
    pub unplaced: Vec<UnplacedAppointment>,
}

impl SlotAssignment {
    pub fn slot(&self, index: usize) -> Option<&SlotDescriptor> {
        self.slots.get(index)
    }

    pub fn is_free(&self, index: usize) -> bool {
        self.slot(index).is_some_and(SlotDescriptor::is_empty)
    }

    pub fn belongs_to(&self, doctor_id: &RecordId, day: NaiveDate) -> bool {
        &self.doctor_id == doctor_id && self.day == day
    }

    /// Placed appointments that hold their slots.
    pub fn placed_appointment_count(&self) -> usize {
        self.placements.iter().filter(|p| !p.released).count()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Every placed appointment with its on-screen position, cancelled ones
    /// included. Conflicting appointments are all returned, so overlapping
    /// blocks stay visible.
    pub fn blocks(&self, unit_slot_height: u32) -> Vec<(Appointment, BlockSpan)> {
        self.placements
            .iter()
            .map(|p| {
                (
                    p.appointment.clone(),
                    block_span(p.start_index, p.span, unit_slot_height),
                )
            })
            .collect()
    }
}

/// Resolve the appointments of `doctor_id` on `day` onto `window`.
///
/// Appointments of other doctors or days are ignored. Cancelled ones get a
/// placement but leave their slots `Empty`, so they never conflict and the
/// slot stays bookable. The result always has `window.slot_count()` slots.
pub fn compute_grid(
    appointments: &[Appointment],
    doctor_id: &RecordId,
    day: NaiveDate,
    window: &OperatingWindow,
) -> SlotAssignment {
    let slot_count = window.slot_count();
    let mut claims: Vec<Vec<usize>> = vec![Vec::new(); slot_count];
    let mut placements = Vec::new();
    let mut unplaced = Vec::new();

    let relevant = appointments
        .iter()
        .filter(|a| &a.doctor_id == doctor_id && a.day() == day);

    for appointment in relevant {
        let time = appointment.start_time();
        let Some(start_index) = window.index_of(time) else {
            let reason = if window.contains(time) {
                UnplacedReason::Misaligned
            } else {
                UnplacedReason::OutsideWindow
            };
            warn!(
                "Appointment {} at {} cannot be placed on the grid: {:?}",
                appointment.id, appointment.start, reason
            );
            unplaced.push(UnplacedAppointment {
                appointment_id: appointment.id.clone(),
                reason,
            });
            continue;
        };

        let wanted = appointment.duration_slots as usize;
        let span = wanted.min(slot_count - start_index);
        if span < wanted {
            warn!(
                "Appointment {} runs past the last slot, clipped to {} of {} slots",
                appointment.id, span, wanted
            );
            unplaced.push(UnplacedAppointment {
                appointment_id: appointment.id.clone(),
                reason: UnplacedReason::Truncated,
            });
        }

        let released = !appointment.occupies_slots();
        if !released {
            let placement_index = placements.len();
            for claim in &mut claims[start_index..start_index + span] {
                claim.push(placement_index);
            }
        }
        placements.push(Placement {
            appointment: appointment.clone(),
            start_index,
            span,
            released,
        });
    }

    let mut conflicts = Vec::new();
    let slots = claims
        .iter()
        .enumerate()
        .map(|(index, claim)| match claim.as_slice() {
            [] => SlotDescriptor::Empty,
            [only] => {
                let placement = &placements[*only];
                if placement.start_index == index {
                    SlotDescriptor::Start {
                        appointment: placement.appointment.clone(),
                        span: placement.span,
                    }
                } else {
                    SlotDescriptor::Continuation {
                        appointment_id: placement.appointment.id.clone(),
                        start_index: placement.start_index,
                    }
                }
            }
            many => {
                let appointment_ids: Vec<RecordId> = many
                    .iter()
                    .map(|&p| placements[p].appointment.id.clone())
                    .collect();
                let time = window
                    .time_at(index)
                    .map(|t| t.format("%H:%M").to_string())
                    .unwrap_or_default();
                warn!(
                    "Slot conflict for doctor {} on {} at {}: appointments {:?}",
                    doctor_id, day, time, appointment_ids
                );
                conflicts.push(SlotConflict {
                    slot_index: index,
                    time,
                    appointment_ids: appointment_ids.clone(),
                });
                SlotDescriptor::Conflict { appointment_ids }
            }
        })
        .collect();

    debug!(
        "Grid for doctor {} on {}: {} placed, {} conflicting slots",
        doctor_id,
        day,
        placements.iter().filter(|p| !p.released).count(),
        conflicts.len()
    );

    SlotAssignment {
        doctor_id: doctor_id.clone(),
        day,
        window: *window,
        slots,
        placements,
        conflicts,
        unplaced,
    }
}
