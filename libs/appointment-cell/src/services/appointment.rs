use reqwest::Method;
use tracing::{debug, info, warn};

use shared_api::ClinicApiClient;
use shared_config::AppConfig;
use shared_models::RecordId;

use crate::models::{
    ingest_appointments, Appointment, AppointmentError, AppointmentRequest, AppointmentStatus,
    RawAppointment, ValidAppointmentRequest,
};
use crate::services::lifecycle::AppointmentLifecycleService;

const APPOINTMENTS_PATH: &str = "/api/appointments";

/// CRUD over the backend's appointment resource. Every record coming back is
/// validated through [`RawAppointment::into_appointment`].
pub struct AppointmentService {
    api: ClinicApiClient,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(ClinicApiClient::new(config))
    }

    pub fn with_client(api: ClinicApiClient) -> Self {
        Self {
            api,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching all appointments");

        let raw: Vec<RawAppointment> = self
            .api
            .request(Method::GET, APPOINTMENTS_PATH, None)
            .await
            .map_err(AppointmentError::from_api)?;

        Ok(ingest_appointments(raw))
    }

    pub async fn list_for_patient(&self, patient_id: &RecordId) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching appointments for patient {}", patient_id);

        let path = format!("{}/patient/{}", APPOINTMENTS_PATH, patient_id);
        let raw: Vec<RawAppointment> = self
            .api
            .request(Method::GET, &path, None)
            .await
            .map_err(AppointmentError::from_api)?;

        Ok(ingest_appointments(raw))
    }

    pub async fn get_appointment(&self, appointment_id: &RecordId) -> Result<Appointment, AppointmentError> {
        let path = format!("{}/{}", APPOINTMENTS_PATH, appointment_id);
        let raw: RawAppointment = self
            .api
            .request(Method::GET, &path, None)
            .await
            .map_err(AppointmentError::from_api)?;

        raw.into_appointment()
    }

    /// Refuses a booking that would overlap an active appointment of the same
    /// doctor. The backend has no per-doctor listing, so the full list is read.
    async fn ensure_no_overlap(
        &self,
        valid: &ValidAppointmentRequest,
        ignore: Option<&RecordId>,
    ) -> Result<(), AppointmentError> {
        if !valid.status.is_active() {
            return Ok(());
        }

        let existing = self.list_appointments().await?;
        match valid.first_overlap(&existing, ignore) {
            Some(clash) => {
                warn!(
                    "Doctor {} at {} overlaps appointment {}",
                    valid.doctor_id, valid.start, clash.id
                );
                Err(AppointmentError::Overlap(clash.id.clone()))
            }
            None => Ok(()),
        }
    }

    pub async fn create_appointment(&self, request: &AppointmentRequest) -> Result<Appointment, AppointmentError> {
        let valid = request.validate()?;
        debug!("Creating appointment for doctor {} at {}", valid.doctor_id, valid.start);
        self.ensure_no_overlap(&valid, None).await?;

        let raw: RawAppointment = self
            .api
            .request(Method::POST, APPOINTMENTS_PATH, Some(valid.to_payload()))
            .await
            .map_err(AppointmentError::from_api)?;

        let created = raw.into_appointment()?;
        info!("Appointment {} created", created.id);
        Ok(created)
    }

    pub async fn update_appointment(
        &self,
        appointment_id: &RecordId,
        request: &AppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let mut valid = request.validate()?;
        debug!("Updating appointment {}", appointment_id);

        let current = self.get_appointment(appointment_id).await?;
        // A form without a status keeps the current one.
        if request.status.is_none() {
            valid.status = current.status;
        }
        self.lifecycle
            .validate_status_transition(&current.status, &valid.status)?;
        self.ensure_no_overlap(&valid, Some(appointment_id)).await?;

        let path = format!("{}/{}", APPOINTMENTS_PATH, appointment_id);
        let raw: RawAppointment = self
            .api
            .request(Method::PUT, &path, Some(valid.to_payload()))
            .await
            .map_err(AppointmentError::from_api)?;

        raw.into_appointment()
    }

    /// Status dropdown change. The transition is checked before the backend
    /// is touched.
    pub async fn update_status(
        &self,
        appointment_id: &RecordId,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_appointment(appointment_id).await?;
        self.lifecycle
            .validate_status_transition(&current.status, &new_status)?;

        if current.status == new_status {
            return Ok(current);
        }

        let mut request = AppointmentRequest::from(&current);
        request.status = Some(new_status);
        let valid = request.validate()?;
        if !current.status.is_active() {
            self.ensure_no_overlap(&valid, Some(appointment_id)).await?;
        }

        let path = format!("{}/{}", APPOINTMENTS_PATH, appointment_id);
        let raw: RawAppointment = self
            .api
            .request(Method::PUT, &path, Some(valid.to_payload()))
            .await
            .map_err(AppointmentError::from_api)?;

        info!("Appointment {} moved {} -> {}", appointment_id, current.status, new_status);
        raw.into_appointment()
    }

    pub async fn delete_appointment(&self, appointment_id: &RecordId) -> Result<(), AppointmentError> {
        debug!("Deleting appointment {}", appointment_id);

        let path = format!("{}/{}", APPOINTMENTS_PATH, appointment_id);
        self.api
            .request_empty(Method::DELETE, &path, None)
            .await
            .map_err(AppointmentError::from_api)
    }
}
