use crate::config::ConfigError;
use crate::dataset::DatasetError;
use crate::export::ExportError;
use crate::pipeline::PipelineError;
use crate::scenarios::{ScenarioError, ScenarioParameterError};
use crate::scoring::{BandError, ConfigurationError, SettingsError};
use crate::telemetry::TelemetryError;
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
    Bands(BandError),
    Settings(SettingsError),
    Configuration(ConfigurationError),
    Dataset(DatasetError),
    Parameter(ScenarioParameterError),
    Export(ExportError),
    /// Background work that panicked or was cancelled.
    Task(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Parameter(_) | AppError::Dataset(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) | AppError::Settings(SettingsError::Invalid(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Bands(_)
            | AppError::Settings(_)
            | AppError::Export(_)
            | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Bands(err) => write!(f, "bands error: {}", err),
            AppError::Settings(err) => write!(f, "settings error: {}", err),
            AppError::Configuration(err) => write!(f, "invalid scoring configuration: {}", err),
            AppError::Dataset(err) => write!(f, "dataset error: {}", err),
            AppError::Parameter(err) => write!(f, "invalid scenario parameters: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
            AppError::Task(message) => write!(f, "background task failed: {}", message),
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
            AppError::Bands(err) => Some(err),
            AppError::Settings(err) => Some(err),
            AppError::Configuration(err) => Some(err),
            AppError::Dataset(err) => Some(err),
            AppError::Parameter(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Task(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
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

impl From<BandError> for AppError {
    fn from(value: BandError) -> Self {
        Self::Bands(value)
    }
}

impl From<SettingsError> for AppError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

impl From<ConfigurationError> for AppError {
    fn from(value: ConfigurationError) -> Self {
        Self::Configuration(value)
    }
}

impl From<DatasetError> for AppError {
    fn from(value: DatasetError) -> Self {
        Self::Dataset(value)
    }
}

impl From<ScenarioParameterError> for AppError {
    fn from(value: ScenarioParameterError) -> Self {
        Self::Parameter(value)
    }
}

impl From<ScenarioError> for AppError {
    fn from(value: ScenarioError) -> Self {
        match value {
            ScenarioError::Parameter(err) => Self::Parameter(err),
            ScenarioError::Configuration(err) => Self::Configuration(err),
        }
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        match value {
            PipelineError::Scenario(err) => err.into(),
            PipelineError::Export(err) => Self::Export(err),
        }
    }
}
