use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::engine::EngineError;
use crate::plot::PlotError;

/// Les deux seules issues d'échec d'une requête /api/run
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Validation de la requête (400), rien n'a été exécuté
    #[error("{0}")]
    InvalidInput(String),
    /// Échec du moteur ou du rendu (500), message brut renvoyé tel quel
    #[error("Simulation failed: {0}")]
    Simulation(String),
}

impl ApiError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ApiError::InvalidInput(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Simulation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Simulation(e.to_string())
    }
}

impl From<PlotError> for ApiError {
    fn from(e: PlotError) -> Self {
        ApiError::Simulation(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
