use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::intervention::{InterventionError, PolicyError, SchemeTableError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Policy(PolicyError),
    Schemes(SchemeTableError),
    Intervention(InterventionError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Policy(err) => write!(f, "policy error: {}", err),
            AppError::Schemes(err) => write!(f, "scheme table error: {}", err),
            AppError::Intervention(err) => write!(f, "intervention error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Policy(err) => Some(err),
            AppError::Schemes(err) => Some(err),
            AppError::Intervention(err) => Some(err),
        }
    }
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Intervention(err) => err.label(),
            AppError::Policy(_) | AppError::Schemes(_) => "invalid_policy",
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Intervention(InterventionError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Intervention(InterventionError::DataUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Policy(_)
            | AppError::Schemes(_)
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "status": "error",
            "error_kind": self.kind(),
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<PolicyError> for AppError {
    fn from(value: PolicyError) -> Self {
        Self::Policy(value)
    }
}

impl From<SchemeTableError> for AppError {
    fn from(value: SchemeTableError) -> Self {
        Self::Schemes(value)
    }
}

impl From<InterventionError> for AppError {
    fn from(value: InterventionError) -> Self {
        Self::Intervention(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::intervention::StudentId;

    #[test]
    fn intervention_errors_keep_their_status_codes() {
        let missing = AppError::from(InterventionError::NotFound(StudentId(9))).into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let outage =
            AppError::from(InterventionError::DataUnavailable("db down".into())).into_response();
        assert_eq!(outage.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn policy_errors_are_internal() {
        let err = AppError::from(PolicyError::Invalid("tiers out of order".into()));
        assert_eq!(err.kind(), "invalid_policy");
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
