use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fanout_protocol::SignalResponse;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SfuError {
    /// Codec, interceptor, or socket setup failed. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed session description: {0}")]
    Decode(String),

    #[error("Room {0} already exists")]
    RoomConflict(String),

    #[error("Room {0} does not exist")]
    RoomNotFound(String),

    #[error("Negotiation failed: {0}")]
    Negotiation(String),
}

impl SfuError {
    pub fn configuration(err: impl std::fmt::Display) -> Self {
        SfuError::Configuration(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        SfuError::Decode(err.to_string())
    }

    pub fn negotiation(stage: &str, err: impl std::fmt::Display) -> Self {
        SfuError::Negotiation(format!("{stage}: {err}"))
    }
}

impl IntoResponse for SfuError {
    fn into_response(self) -> Response {
        match &self {
            SfuError::Configuration(e) => {
                tracing::error!("Configuration error while serving request: {}", e);
            }
            other => {
                tracing::warn!("Signaling request failed: {}", other);
            }
        }

        // Signaling clients read the outcome from `code`, never the HTTP status
        (StatusCode::OK, Json(SignalResponse::failure(self.to_string()))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, SfuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_room() {
        assert_eq!(
            SfuError::RoomConflict("lobby".into()).to_string(),
            "Room lobby already exists"
        );
        assert_eq!(
            SfuError::RoomNotFound("lobby".into()).to_string(),
            "Room lobby does not exist"
        );
        assert_eq!(
            SfuError::negotiation("create answer", "no codecs").to_string(),
            "Negotiation failed: create answer: no codecs"
        );
    }

    #[test]
    fn errors_render_as_failed_signal_response() {
        let response = SfuError::decode("invalid padding").into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
