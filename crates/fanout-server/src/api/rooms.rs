use crate::error::{Result, SfuError};
use crate::state::AppState;
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use fanout_protocol::{SignalRequest, SignalResponse};

/// Malformed bodies get a failed signal response, not a 4xx
fn signal_request(payload: std::result::Result<Json<SignalRequest>, JsonRejection>) -> Result<SignalRequest> {
    let Json(request) = payload.map_err(|e| SfuError::decode(e.body_text()))?;
    Ok(request)
}

pub async fn publish(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignalRequest>, JsonRejection>,
) -> Result<Json<SignalResponse>> {
    let request = signal_request(payload)?;
    tracing::info!("Publish request for room {}", request.room_id);

    let answer = state.sfu.publish(&request.room_id, &request.sdp).await?;

    Ok(Json(SignalResponse::answer(answer)))
}

pub async fn play(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignalRequest>, JsonRejection>,
) -> Result<Json<SignalResponse>> {
    let request = signal_request(payload)?;
    tracing::info!("Play request for room {}", request.room_id);

    let answer = state.sfu.play(&request.room_id, &request.sdp).await?;

    Ok(Json(SignalResponse::answer(answer)))
}
