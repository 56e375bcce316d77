use axum::{extract::State, Json};
use shared::api::{WalletBalanceResponse, WalletTransferRequest, WalletTransferResponse};

use crate::{
    errors::Result,
    extractors::{BearerAuth, ValidatedJson},
    state::AppState,
};

pub async fn balance(State(state): State<AppState>, _auth: BearerAuth) -> Json<WalletBalanceResponse> {
    Json(state.house.lock().wallet_balance())
}

pub async fn deposit(
    State(state): State<AppState>,
    _auth: BearerAuth,
    ValidatedJson(req): ValidatedJson<WalletTransferRequest>,
) -> Result<Json<WalletTransferResponse>> {
    let confirmation = state.house.lock().deposit(&req)?;

    tracing::info!(
        transaction_id = %confirmation.transaction_id,
        amount = %confirmation.amount,
        "Deposit applied"
    );
    metrics::counter!("wallet_deposits_total").increment(1);

    Ok(Json(confirmation))
}

pub async fn withdraw(
    State(state): State<AppState>,
    _auth: BearerAuth,
    ValidatedJson(req): ValidatedJson<WalletTransferRequest>,
) -> Result<Json<WalletTransferResponse>> {
    let confirmation = state.house.lock().withdraw(&req)?;

    tracing::info!(
        transaction_id = %confirmation.transaction_id,
        amount = %confirmation.amount,
        "Withdrawal applied"
    );
    metrics::counter!("wallet_withdrawals_total").increment(1);

    Ok(Json(confirmation))
}
