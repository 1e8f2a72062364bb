use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// The clinic backend could not be reached at all.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The clinic backend answered with a non-success status.
    #[error("Backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Invalid fields: {}", describe_fields(.0))]
    InvalidFields(BTreeMap<String, String>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

fn describe_fields(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(field, problem)| format!("{}: {}", field, problem))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Rejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidFields(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message meant to be shown next to the form or action that failed.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Transport(_) => {
                "Could not reach the clinic server. Check your connection and try again.".to_string()
            }
            AppError::Rejected { status, message } => match status {
                400 => "The server rejected the submitted data.".to_string(),
                401 => "You are not authorized to perform this action.".to_string(),
                403 => "Access to this resource is forbidden.".to_string(),
                404 => "The requested record no longer exists.".to_string(),
                500..=599 => {
                    "The clinic server had an internal error. Please try again later.".to_string()
                }
                _ => message.clone(),
            },
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::InvalidFields(_) => "Some fields are invalid.".to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        tracing::error!("Error: {}: {}", status, self);

        let mut body = json!({
            "error": self.to_string(),
            "userMessage": self.user_message(),
        });
        if let AppError::InvalidFields(fields) = &self {
            body["fields"] = json!(fields);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_keeps_backend_status() {
        let err = AppError::Rejected { status: 404, message: "gone".into() };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "The requested record no longer exists.");
    }

    #[test]
    fn transport_maps_to_bad_gateway() {
        let err = AppError::Transport("connection refused".into());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.user_message().starts_with("Could not reach"));
        assert!(err.is_transport());
    }

    #[test]
    fn invalid_fields_are_listed_in_display() {
        let mut fields = BTreeMap::new();
        fields.insert("doctorId".to_string(), "required".to_string());
        fields.insert("start".to_string(), "must be on :00 or :30".to_string());
        let err = AppError::InvalidFields(fields);

        assert_eq!(
            err.to_string(),
            "Invalid fields: doctorId: required; start: must be on :00 or :30"
        );
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
