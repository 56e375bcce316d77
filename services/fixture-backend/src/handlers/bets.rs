use axum::{
    extract::{Path, State},
    Json,
};
use shared::api::{PlaceBetRequest, PlaceBetResponse};

use crate::{
    errors::Result,
    extractors::{BearerAuth, ValidatedJson},
    state::AppState,
};

pub async fn place_bet(
    State(state): State<AppState>,
    _auth: BearerAuth,
    ValidatedJson(req): ValidatedJson<PlaceBetRequest>,
) -> Result<Json<PlaceBetResponse>> {
    let span = tracing::info_span!(
        "place_bet",
        bet.session_id = %req.session_id,
        bet.game_id = %req.game_id,
        bet.amount = %req.bet_amount
    );
    let _enter = span.enter();

    let response = state.house.lock().place_bet(&req)?;

    match &response {
        PlaceBetResponse::Settled(settlement) => tracing::info!(
            round_id = %settlement.round_id,
            win_amount = %settlement.win_amount,
            balance_after = %settlement.balance_after,
            "Bet settled"
        ),
        PlaceBetResponse::Pending(pending) => {
            tracing::info!(round_id = %pending.round_id, "Bet accepted, settlement deferred")
        }
    }
    metrics::counter!("bets_created_total").increment(1);

    Ok(Json(response))
}

pub async fn get_bet(
    State(state): State<AppState>,
    _auth: BearerAuth,
    Path(round_id): Path<String>,
) -> Result<Json<PlaceBetResponse>> {
    let response = state.house.lock().fetch_bet(&round_id)?;
    tracing::debug!(round_id = %round_id, "Bet fetched");
    Ok(Json(response))
}
