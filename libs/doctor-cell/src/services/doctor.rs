use reqwest::Method;
use tracing::debug;

use shared_api::ClinicApiClient;
use shared_config::AppConfig;
use shared_models::RecordId;

use crate::models::{ingest_doctors, Doctor, DoctorError, RawDoctor};

const DOCTORS_PATH: &str = "/api/doctors";

pub struct DoctorService {
    api: ClinicApiClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            api: ClinicApiClient::new(config),
        }
    }

    pub fn with_client(api: ClinicApiClient) -> Self {
        Self { api }
    }

    /// Fetch the roster used for the grid column headers.
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Fetching doctor roster");

        let raw: Vec<RawDoctor> = self.api.request(Method::GET, DOCTORS_PATH, None).await?;
        let doctors = ingest_doctors(raw);

        debug!("Loaded {} doctors", doctors.len());
        Ok(doctors)
    }

    pub async fn get_doctor(&self, doctor_id: &RecordId) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor {}", doctor_id);

        let path = format!("{}/{}", DOCTORS_PATH, doctor_id);
        let raw: RawDoctor = self.api.request(Method::GET, &path, None).await?;

        raw.into_doctor()
    }
}
