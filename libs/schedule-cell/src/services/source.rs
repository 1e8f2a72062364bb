use async_trait::async_trait;

use appointment_cell::models::{Appointment, AppointmentRequest, AppointmentStatus};
use appointment_cell::services::AppointmentService;
use doctor_cell::models::Doctor;
use doctor_cell::services::DoctorService;
use shared_config::AppConfig;
use shared_models::{error::AppError, RecordId};

use crate::controller::ScheduleSource;

/// [`ScheduleSource`] backed by the clinic REST backend.
pub struct ClinicScheduleSource {
    appointments: AppointmentService,
    doctors: DoctorService,
}

impl ClinicScheduleSource {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            appointments: AppointmentService::new(config),
            doctors: DoctorService::new(config),
        }
    }
}

#[async_trait]
impl ScheduleSource for ClinicScheduleSource {
    async fn fetch_appointments(&self) -> Result<Vec<Appointment>, AppError> {
        Ok(self.appointments.list_appointments().await?)
    }

    async fn fetch_doctors(&self) -> Result<Vec<Doctor>, AppError> {
        Ok(self.doctors.list_doctors().await?)
    }

    async fn create_appointment(&self, request: &AppointmentRequest) -> Result<Appointment, AppError> {
        Ok(self.appointments.create_appointment(request).await?)
    }

    async fn update_appointment(
        &self,
        appointment_id: &RecordId,
        request: &AppointmentRequest,
    ) -> Result<Appointment, AppError> {
        Ok(self.appointments.update_appointment(appointment_id, request).await?)
    }

    async fn update_status(
        &self,
        appointment_id: &RecordId,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppError> {
        Ok(self.appointments.update_status(appointment_id, status).await?)
    }

    async fn delete_appointment(&self, appointment_id: &RecordId) -> Result<(), AppError> {
        Ok(self.appointments.delete_appointment(appointment_id).await?)
    }
}
