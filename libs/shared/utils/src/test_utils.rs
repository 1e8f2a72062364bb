use std::sync::Arc;

use chrono::NaiveTime;
use serde_json::{json, Value};

use shared_config::AppConfig;

pub struct TestConfig {
    pub clinic_api_url: String,
    pub open_time: NaiveTime,
    pub last_slot: NaiveTime,
    pub slot_height_px: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            clinic_api_url: "http://localhost:8080".to_string(),
            open_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            last_slot: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            slot_height_px: 48,
        }
    }
}

impl TestConfig {
    /// Points the config at a mock backend, usually `MockServer::uri()`.
    pub fn with_backend(url: &str) -> Self {
        Self {
            clinic_api_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            clinic_api_url: self.clinic_api_url.clone(),
            clinic_open_time: self.open_time,
            clinic_last_slot: self.last_slot,
            slot_height_px: self.slot_height_px,
            request_timeout_secs: 5,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct MockClinicResponses;

impl MockClinicResponses {
    pub fn doctor_response(id: i64, full_name: &str) -> Value {
        json!({
            "id": id,
            "nombreCompleto": full_name,
            "especialidad": "Odontología general"
        })
    }

    /// `start` is a wall-clock timestamp such as `2025-05-16T09:00:00`.
    pub fn appointment_response(
        id: i64,
        doctor_id: i64,
        patient_id: i64,
        start: &str,
        duration_slots: i64,
        status: &str,
    ) -> Value {
        json!({
            "id": id,
            "doctorId": doctor_id,
            "patientId": patient_id,
            "start": start,
            "durationSlots": duration_slots,
            "status": status,
            "notes": null,
            "patientName": format!("Paciente {}", patient_id),
            "treatment": "Limpieza"
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({
            "error": message
        })
    }
}
