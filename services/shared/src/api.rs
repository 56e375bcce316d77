//! Request and response shapes of the game REST surface
//!
//! Field names follow the backend: snake_case everywhere except the session
//! and wallet-balance responses, which the backend emits in camelCase.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Credits;

/// Free-form per-game bet options (lines, feature toggles, ...)
pub type BetOptions = serde_json::Map<String, serde_json::Value>;

/// `POST /games/sessions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub game_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_amount: Option<Credits>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub game_id: String,
    pub start_time: DateTime<Utc>,
    pub initial_balance: Credits,
}

/// `POST /games/sessions/end`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndSessionRequest {
    pub session_id: String,
}

/// `POST /games/bets`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceBetRequest {
    pub session_id: String,
    pub bet_amount: Credits,
    pub game_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_options: Option<BetOptions>,
}

/// Authoritative outcome of one bet
///
/// Returned by `POST /games/bets`, `GET /games/bets/{id}` and as the items of
/// `GET /bets/history`. History items additionally carry the game and session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementPayload {
    pub round_id: String,
    pub transaction_id: String,
    pub bet_amount: Credits,
    pub win_amount: Credits,
    pub balance_before: Credits,
    pub balance_after: Credits,
    pub symbols: Vec<String>,
    pub multiplier: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    Pending,
}

/// A bet the backend accepted but has not settled yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingBet {
    pub round_id: String,
    pub status: PendingStatus,
}

/// Answer of the place-bet and fetch-bet endpoints
///
/// Depending on backend mode the settlement is either inline or deferred to
/// a follow-up `GET /games/bets/{round_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaceBetResponse {
    Settled(SettlementPayload),
    Pending(PendingBet),
}

impl PlaceBetResponse {
    pub fn round_id(&self) -> &str {
        match self {
            PlaceBetResponse::Settled(settlement) => &settlement.round_id,
            PlaceBetResponse::Pending(pending) => &pending.round_id,
        }
    }
}

/// `GET /bets/history` query string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub items: Vec<SettlementPayload>,
    pub total_count: u64,
}

/// `GET /wallet/balance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalanceResponse {
    pub balance: Credits,
    pub total_deposit: Credits,
    pub total_withdraw: Credits,
    pub total_bet: Credits,
    pub total_win: Credits,
}

/// `POST /wallet/deposit` and `POST /wallet/withdraw`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransferRequest {
    pub amount: Credits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransferResponse {
    pub transaction_id: String,
    pub amount: Credits,
}
