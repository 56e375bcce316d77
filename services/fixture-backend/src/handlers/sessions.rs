use axum::{extract::State, Json};
use serde_json::{json, Value};
use shared::api::{CreateSessionRequest, EndSessionRequest, SessionResponse};

use crate::{
    errors::Result,
    extractors::{BearerAuth, ValidatedJson},
    state::AppState,
};

pub async fn create_session(
    State(state): State<AppState>,
    _auth: BearerAuth,
    ValidatedJson(req): ValidatedJson<CreateSessionRequest>,
) -> Result<Json<SessionResponse>> {
    let session = state.house.lock().create_session(&req)?;

    tracing::info!(
        session_id = %session.session_id,
        game_id = %session.game_id,
        initial_balance = %session.initial_balance,
        "Session created"
    );
    metrics::counter!("sessions_created_total").increment(1);

    Ok(Json(session))
}

pub async fn end_session(
    State(state): State<AppState>,
    _auth: BearerAuth,
    ValidatedJson(req): ValidatedJson<EndSessionRequest>,
) -> Result<Json<Value>> {
    state.house.lock().end_session(&req)?;

    tracing::info!(session_id = %req.session_id, "Session ended");
    Ok(Json(json!({})))
}
