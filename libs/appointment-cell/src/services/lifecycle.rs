// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, info, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Status policy for the status dropdown. Setting the current status again is
/// always accepted as a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status == new_status {
            return Ok(());
        }

        if !self.get_valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: *current_status,
                to: *new_status,
            });
        }

        info!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::WaitingRoom,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Pending,
                AppointmentStatus::WaitingRoom,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::WaitingRoom => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::InProgress => vec![
                AppointmentStatus::WaitingRoom,
                AppointmentStatus::Completed,
            ],
            // Reinstating a cancelled appointment sends it back to the start.
            AppointmentStatus::Cancelled => vec![AppointmentStatus::Pending],
            AppointmentStatus::Completed => vec![],
        }
    }

    /// Options for the status dropdown: the current status first, then every
    /// status reachable from it.
    pub fn selectable_statuses(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        let mut options = vec![*current_status];
        options.extend(self.get_valid_transitions(current_status));
        options
    }
}
