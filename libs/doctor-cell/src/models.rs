use serde::{Deserialize, Serialize};
use tracing::warn;

use shared_models::{error::AppError, RecordId};

/// A doctor as the schedule sees it: one grid column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: RecordId,
    pub display_name: String,
    pub specialty: Option<String>,
}

impl Doctor {
    pub fn new(id: impl Into<RecordId>, display_name: &str) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.to_string(),
            specialty: None,
        }
    }

    /// First letter of the name, used for the column avatar.
    pub fn initial(&self) -> char {
        self.display_name
            .chars()
            .find(|c| c.is_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('D')
    }
}

/// Doctor record exactly as the backend sends it. Several naming schemes are
/// in circulation; they are reconciled once in [`RawDoctor::into_doctor`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDoctor {
    pub id: Option<RecordId>,
    pub display_name: Option<String>,
    pub nombre_completo: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub especialidad: Option<String>,
    pub specialty: Option<String>,
}

impl RawDoctor {
    pub fn into_doctor(self) -> Result<Doctor, DoctorError> {
        let id = match self.id {
            Some(id) if !id.is_blank() => id,
            _ => return Err(DoctorError::Malformed("doctor record without id".to_string())),
        };

        let joined = match (self.first_name, self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first.trim(), last.trim())),
            (Some(first), None) => Some(first),
            (None, Some(last)) => Some(last),
            (None, None) => None,
        };

        let display_name = [self.display_name, self.nombre_completo, self.name, joined]
            .into_iter()
            .flatten()
            .map(|n| n.trim().to_string())
            .find(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Doctor {}", id));

        Ok(Doctor {
            id,
            display_name,
            specialty: self.specialty.or(self.especialidad).filter(|s| !s.trim().is_empty()),
        })
    }
}

/// Converts a backend list, dropping and logging the records that cannot be
/// used as grid columns.
pub fn ingest_doctors(raw: Vec<RawDoctor>) -> Vec<Doctor> {
    raw.into_iter()
        .filter_map(|record| match record.into_doctor() {
            Ok(doctor) => Some(doctor),
            Err(e) => {
                warn!("Skipping doctor record: {}", e);
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum DoctorError {
    NotFound,
    Malformed(String),
    Api(AppError),
}

impl std::fmt::Display for DoctorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoctorError::NotFound => write!(f, "Doctor not found"),
            DoctorError::Malformed(msg) => write!(f, "Malformed doctor record: {}", msg),
            DoctorError::Api(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DoctorError {}

impl From<AppError> for DoctorError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Rejected { status: 404, .. } => DoctorError::NotFound,
            other => DoctorError::Api(other),
        }
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::Malformed(msg) => AppError::Internal(msg),
            DoctorError::Api(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawDoctor {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn prefers_explicit_display_name_then_full_name() {
        let doctor = raw(json!({ "id": 1, "nombreCompleto": "Ana Martínez", "name": "Ana" }))
            .into_doctor()
            .unwrap();
        assert_eq!(doctor.display_name, "Ana Martínez");

        let doctor = raw(json!({ "id": 2, "firstName": "Luis", "lastName": "García" }))
            .into_doctor()
            .unwrap();
        assert_eq!(doctor.display_name, "Luis García");
    }

    #[test]
    fn nameless_doctor_gets_placeholder() {
        let doctor = raw(json!({ "id": 9 })).into_doctor().unwrap();
        assert_eq!(doctor.display_name, "Doctor 9");
        assert_eq!(doctor.initial(), 'D');
    }

    #[test]
    fn record_without_id_is_skipped() {
        let doctors = ingest_doctors(vec![
            raw(json!({ "nombreCompleto": "Sin Id" })),
            raw(json!({ "id": "d-1", "nombreCompleto": "Rosa Díaz", "especialidad": "Ortodoncia" })),
        ]);

        assert_eq!(doctors.len(), 1);
        assert_eq!(doctors[0].id, RecordId::Text("d-1".into()));
        assert_eq!(doctors[0].specialty.as_deref(), Some("Ortodoncia"));
    }
}
