use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::api::{BetOptions, SessionResponse, SettlementPayload};
use shared::{AmountError, Credits};

use crate::errors::FailureKind;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Server-issued play session handle
    SessionId
);
string_id!(
    /// Game catalogue identifier
    GameId
);
string_id!(
    /// Server round identifier of a bet, unique across history
    BetId
);

/// A server-tracked handle authorizing bets against one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub game_id: GameId,
    pub started_at: DateTime<Utc>,
    pub initial_balance: Credits,
}

impl From<SessionResponse> for Session {
    fn from(resp: SessionResponse) -> Self {
        Self {
            session_id: SessionId::new(resp.session_id),
            game_id: GameId::new(resp.game_id),
            started_at: resp.start_time,
            initial_balance: resp.initial_balance,
        }
    }
}

/// One wager against an active session. Immutable once submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct BetRequest {
    session_id: SessionId,
    game_id: GameId,
    amount: Credits,
    options: Option<BetOptions>,
}

impl BetRequest {
    pub fn new(session: &Session, amount: Credits) -> Self {
        Self {
            session_id: session.session_id.clone(),
            game_id: session.game_id.clone(),
            amount,
            options: None,
        }
    }

    pub fn with_options(mut self, options: BetOptions) -> Self {
        self.options = Some(options);
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn amount(&self) -> Credits {
        self.amount
    }

    pub fn options(&self) -> Option<&BetOptions> {
        self.options.as_ref()
    }
}

/// Settled outcome of a bet, as reported by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetResult {
    pub bet_id: BetId,
    pub transaction_id: String,
    pub session_id: Option<SessionId>,
    pub game_id: Option<GameId>,
    pub is_win: bool,
    pub bet_amount: Credits,
    pub win_amount: Credits,
    pub balance_before: Credits,
    pub new_balance: Credits,
    pub result_symbols: Vec<String>,
    pub multiplier: f64,
    pub timestamp: DateTime<Utc>,
}

impl BetResult {
    /// `balance_before - bet_amount + win_amount`
    pub fn expected_balance(&self) -> Result<Credits, AmountError> {
        self.balance_before
            .checked_sub(self.bet_amount)?
            .checked_add(self.win_amount)
    }
}

impl From<SettlementPayload> for BetResult {
    fn from(payload: SettlementPayload) -> Self {
        Self {
            bet_id: BetId::new(payload.round_id),
            transaction_id: payload.transaction_id,
            session_id: payload.session_id.map(SessionId::new),
            game_id: payload.game_id.map(GameId::new),
            is_win: payload.win_amount.is_positive(),
            bet_amount: payload.bet_amount,
            win_amount: payload.win_amount,
            balance_before: payload.balance_before,
            new_balance: payload.balance_after,
            result_symbols: payload.symbols,
            multiplier: payload.multiplier,
            timestamp: payload.created_at,
        }
    }
}

/// Lifecycle of the single bet a session may have in flight
#[derive(Debug, Clone, PartialEq)]
pub enum BetLifecycleState {
    Idle,
    Placing(BetRequest),
    AwaitingResult { request: BetRequest, round_id: BetId },
    Settled(BetResult),
    Failed(FailureKind),
}

impl BetLifecycleState {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            BetLifecycleState::Placing(_) | BetLifecycleState::AwaitingResult { .. }
        )
    }

    /// Stake of the in-flight bet, if any
    pub fn in_flight_amount(&self) -> Option<Credits> {
        match self {
            BetLifecycleState::Placing(request)
            | BetLifecycleState::AwaitingResult { request, .. } => Some(request.amount()),
            _ => None,
        }
    }

    pub fn settled(&self) -> Option<&BetResult> {
        match self {
            BetLifecycleState::Settled(result) => Some(result),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BetLifecycleState::Idle => "idle",
            BetLifecycleState::Placing(_) => "placing",
            BetLifecycleState::AwaitingResult { .. } => "awaiting_result",
            BetLifecycleState::Settled(_) => "settled",
            BetLifecycleState::Failed(_) => "failed",
        }
    }
}

/// Optional narrowing of the bet history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub game_id: Option<GameId>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl HistoryFilter {
    pub fn for_game(game_id: GameId) -> Self {
        Self {
            game_id: Some(game_id),
            ..Self::default()
        }
    }
}

/// Merged view of the history pages loaded so far
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    /// Every item loaded since the last page-1 load, in request order
    pub items: Vec<BetResult>,
    /// Last page merged into `items`
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

impl HistoryPage {
    pub fn has_more(&self) -> bool {
        u64::from(self.page) * u64::from(self.page_size) < self.total_count
    }
}
