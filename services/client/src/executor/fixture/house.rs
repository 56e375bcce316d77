//! In-memory game backend
//!
//! A seeded, single-wallet simulation of the game REST surface. Every
//! operation mirrors an endpoint and fails with the same `ServiceError` the
//! real backend would send, so the HTTP fixture backend can serve it as-is.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::api::{
    CreateSessionRequest, EndSessionRequest, HistoryQuery, HistoryResponse, PendingBet,
    PendingStatus, PlaceBetRequest, PlaceBetResponse, SessionResponse, SettlementPayload,
    WalletBalanceResponse, WalletTransferRequest, WalletTransferResponse,
};
use shared::errors::ServiceError;
use shared::{Credits, MAX_PAGE_SIZE};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// Reel symbols, lowest to highest paying
pub const SYMBOLS: [&str; 5] = ["cherry", "lemon", "bell", "bar", "seven"];

/// Game catalogue: (game_id, accepting play)
pub const GAMES: [(&str, bool); 3] = [
    ("classic-fruits", true),
    ("lucky-sevens", true),
    ("retired-reels", false),
];

/// Three-reel paytable
///
/// Three of a kind pays the symbol's multiplier; two leading cherries pay 2x.
pub fn paytable_multiplier(symbols: &[String]) -> f64 {
    match symbols {
        [a, b, c] if a == b && b == c => match a.as_str() {
            "cherry" => 5.0,
            "lemon" => 8.0,
            "bell" => 10.0,
            "bar" => 20.0,
            "seven" => 100.0,
            _ => 0.0,
        },
        [a, b, _] if a == "cherry" && b == "cherry" => 2.0,
        _ => 0.0,
    }
}

/// Predetermined outcome for the next spin
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedSpin {
    pub symbols: Vec<String>,
    pub win_amount: Credits,
    /// Report this `balance_after` instead of the true one
    pub reported_balance_after: Option<Credits>,
}

impl ScriptedSpin {
    pub fn loss() -> Self {
        Self {
            symbols: vec!["cherry".into(), "bell".into(), "seven".into()],
            win_amount: Credits::ZERO,
            reported_balance_after: None,
        }
    }

    pub fn win(amount: i64) -> Self {
        Self {
            symbols: vec!["seven".into(), "seven".into(), "seven".into()],
            win_amount: Credits::new(amount),
            reported_balance_after: None,
        }
    }

    pub fn reporting_balance(mut self, balance_after: i64) -> Self {
        self.reported_balance_after = Some(Credits::new(balance_after));
        self
    }
}

#[derive(Debug, Clone)]
struct HouseSession {
    game_id: String,
    active: bool,
}

#[derive(Debug, Clone)]
struct DeferredRound {
    settlement: SettlementPayload,
    polls_remaining: u32,
}

pub struct FixtureHouse {
    rng: StdRng,
    balance: Credits,
    total_deposit: Credits,
    total_withdraw: Credits,
    total_bet: Credits,
    total_win: Credits,
    games: HashMap<String, bool>,
    sessions: HashMap<String, HouseSession>,
    /// Settled rounds, oldest first
    rounds: Vec<SettlementPayload>,
    deferred: HashMap<String, DeferredRound>,
    scripted: VecDeque<ScriptedSpin>,
    /// When set, bets settle only after this many result polls
    deferred_polls: Option<u32>,
}

impl FixtureHouse {
    pub fn new(seed: u64, initial_balance: Credits) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            balance: initial_balance,
            total_deposit: initial_balance,
            total_withdraw: Credits::ZERO,
            total_bet: Credits::ZERO,
            total_win: Credits::ZERO,
            games: GAMES
                .iter()
                .map(|(id, active)| (id.to_string(), *active))
                .collect(),
            sessions: HashMap::new(),
            rounds: Vec::new(),
            deferred: HashMap::new(),
            scripted: VecDeque::new(),
            deferred_polls: None,
        }
    }

    pub fn balance(&self) -> Credits {
        self.balance
    }

    pub fn script_spin(&mut self, spin: ScriptedSpin) {
        self.scripted.push_back(spin);
    }

    /// Settle bets only after `polls` result fetches; `None` settles inline
    pub fn set_deferred_settlement(&mut self, polls: Option<u32>) {
        self.deferred_polls = polls;
    }

    pub fn set_game_active(&mut self, game_id: &str, active: bool) {
        self.games.insert(game_id.to_string(), active);
    }

    /// Drop a session server-side, as an idle timeout would
    pub fn expire_session(&mut self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.values().filter(|s| s.active).count()
    }

    pub fn create_session(&mut self, req: &CreateSessionRequest) -> Result<SessionResponse, ServiceError> {
        match self.games.get(&req.game_id) {
            None => return Err(ServiceError::game_not_found(&req.game_id)),
            Some(false) => return Err(ServiceError::game_inactive(&req.game_id)),
            Some(true) => {}
        }

        if let Some(amount) = req.bet_amount {
            self.check_stake(amount)?;
        }

        let session_id = Uuid::new_v4().simple().to_string();
        self.sessions.insert(
            session_id.clone(),
            HouseSession {
                game_id: req.game_id.clone(),
                active: true,
            },
        );

        Ok(SessionResponse {
            session_id,
            game_id: req.game_id.clone(),
            start_time: Utc::now(),
            initial_balance: self.balance,
        })
    }

    pub fn end_session(&mut self, req: &EndSessionRequest) -> Result<(), ServiceError> {
        match self.sessions.get_mut(&req.session_id) {
            Some(session) => {
                session.active = false;
                Ok(())
            }
            None => Err(ServiceError::session_not_found(&req.session_id)),
        }
    }

    pub fn place_bet(&mut self, req: &PlaceBetRequest) -> Result<PlaceBetResponse, ServiceError> {
        let session = self
            .sessions
            .get(&req.session_id)
            .filter(|s| s.active)
            .ok_or_else(|| ServiceError::session_not_found(&req.session_id))?;

        if session.game_id != req.game_id {
            return Err(ServiceError::invalid_input(format!(
                "session {} plays {}, not {}",
                req.session_id, session.game_id, req.game_id
            )));
        }

        self.check_stake(req.bet_amount)?;

        let settlement = self.spin(&req.game_id, Some(req.session_id.clone()), req.bet_amount)?;

        match self.deferred_polls {
            Some(polls) => {
                let round_id = settlement.round_id.clone();
                self.deferred.insert(
                    round_id.clone(),
                    DeferredRound {
                        settlement,
                        polls_remaining: polls,
                    },
                );
                Ok(PlaceBetResponse::Pending(PendingBet {
                    round_id,
                    status: PendingStatus::Pending,
                }))
            }
            None => Ok(PlaceBetResponse::Settled(settlement)),
        }
    }

    pub fn fetch_bet(&mut self, round_id: &str) -> Result<PlaceBetResponse, ServiceError> {
        if let Some(round) = self.deferred.get_mut(round_id) {
            if round.polls_remaining > 0 {
                round.polls_remaining -= 1;
                return Ok(PlaceBetResponse::Pending(PendingBet {
                    round_id: round_id.to_string(),
                    status: PendingStatus::Pending,
                }));
            }
            self.deferred.remove(round_id);
        }

        self.rounds
            .iter()
            .find(|r| r.round_id == round_id)
            .cloned()
            .map(PlaceBetResponse::Settled)
            .ok_or_else(|| ServiceError::bet_not_found(round_id))
    }

    /// Play a round outside any client session, e.g. from another device
    pub fn record_round(&mut self, game_id: &str, amount: Credits) -> Result<SettlementPayload, ServiceError> {
        self.check_stake(amount)?;
        self.spin(game_id, None, amount)
    }

    pub fn history(&self, query: &HistoryQuery) -> Result<HistoryResponse, ServiceError> {
        if query.page == 0 {
            return Err(ServiceError::invalid_page("page must be at least 1"));
        }
        if query.page_size == 0 || query.page_size > MAX_PAGE_SIZE {
            return Err(ServiceError::invalid_page(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let matching: Vec<&SettlementPayload> = self
            .rounds
            .iter()
            .rev()
            .filter(|r| !self.deferred.contains_key(&r.round_id))
            .filter(|r| match &query.game_id {
                Some(game_id) => r.game_id.as_deref() == Some(game_id.as_str()),
                None => true,
            })
            .filter(|r| {
                let day = r.created_at.date_naive();
                query.start_date.map_or(true, |start| day >= start)
                    && query.end_date.map_or(true, |end| day <= end)
            })
            .collect();

        let offset = (query.page as usize - 1) * query.page_size as usize;
        let items = matching
            .iter()
            .skip(offset)
            .take(query.page_size as usize)
            .map(|r| (*r).clone())
            .collect();

        Ok(HistoryResponse {
            items,
            total_count: matching.len() as u64,
        })
    }

    pub fn wallet_balance(&self) -> WalletBalanceResponse {
        WalletBalanceResponse {
            balance: self.balance,
            total_deposit: self.total_deposit,
            total_withdraw: self.total_withdraw,
            total_bet: self.total_bet,
            total_win: self.total_win,
        }
    }

    pub fn deposit(&mut self, req: &WalletTransferRequest) -> Result<WalletTransferResponse, ServiceError> {
        if !req.amount.is_positive() {
            return Err(ServiceError::invalid_amount(req.amount.as_i64(), "deposit must be positive"));
        }
        self.balance = self.add(self.balance, req.amount)?;
        self.total_deposit = self.add(self.total_deposit, req.amount)?;

        Ok(WalletTransferResponse {
            transaction_id: Uuid::new_v4().simple().to_string(),
            amount: req.amount,
        })
    }

    pub fn withdraw(&mut self, req: &WalletTransferRequest) -> Result<WalletTransferResponse, ServiceError> {
        self.check_stake(req.amount)?;
        self.balance = self.sub(self.balance, req.amount)?;
        self.total_withdraw = self.add(self.total_withdraw, req.amount)?;

        Ok(WalletTransferResponse {
            transaction_id: Uuid::new_v4().simple().to_string(),
            amount: req.amount,
        })
    }

    fn check_stake(&self, amount: Credits) -> Result<(), ServiceError> {
        if !amount.is_positive() {
            return Err(ServiceError::invalid_amount(amount.as_i64(), "amount must be positive"));
        }
        if amount > self.balance {
            return Err(ServiceError::insufficient_funds(
                amount.as_i64(),
                self.balance.as_i64(),
            ));
        }
        Ok(())
    }

    fn spin(
        &mut self,
        game_id: &str,
        session_id: Option<String>,
        amount: Credits,
    ) -> Result<SettlementPayload, ServiceError> {
        let (symbols, win_amount, reported) = match self.scripted.pop_front() {
            Some(spin) => (spin.symbols, spin.win_amount, spin.reported_balance_after),
            None => {
                let symbols: Vec<String> = (0..3)
                    .map(|_| SYMBOLS[self.rng.gen_range(0..SYMBOLS.len())].to_string())
                    .collect();
                let win = amount
                    .scaled(paytable_multiplier(&symbols))
                    .map_err(|e| ServiceError::internal(e.to_string()))?;
                (symbols, win, None)
            }
        };

        let balance_before = self.balance;
        let balance_after = self.add(self.sub(balance_before, amount)?, win_amount)?;
        self.balance = balance_after;
        self.total_bet = self.add(self.total_bet, amount)?;
        self.total_win = self.add(self.total_win, win_amount)?;

        let multiplier = if amount.is_positive() {
            win_amount.as_i64() as f64 / amount.as_i64() as f64
        } else {
            0.0
        };

        let settlement = SettlementPayload {
            round_id: Uuid::new_v4().simple().to_string(),
            transaction_id: Uuid::new_v4().simple().to_string(),
            bet_amount: amount,
            win_amount,
            balance_before,
            balance_after: reported.unwrap_or(balance_after),
            symbols,
            multiplier,
            created_at: Utc::now(),
            session_id,
            game_id: Some(game_id.to_string()),
        };
        self.rounds.push(settlement.clone());

        Ok(settlement)
    }

    fn add(&self, a: Credits, b: Credits) -> Result<Credits, ServiceError> {
        a.checked_add(b).map_err(|e| ServiceError::internal(e.to_string()))
    }

    fn sub(&self, a: Credits, b: Credits) -> Result<Credits, ServiceError> {
        a.checked_sub(b).map_err(|e| ServiceError::internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn house() -> FixtureHouse {
        FixtureHouse::new(7, Credits::new(100))
    }

    fn open(house: &mut FixtureHouse) -> String {
        house
            .create_session(&CreateSessionRequest {
                game_id: "classic-fruits".to_string(),
                bet_amount: None,
            })
            .unwrap()
            .session_id
    }

    fn bet(session_id: &str, amount: i64) -> PlaceBetRequest {
        PlaceBetRequest {
            session_id: session_id.to_string(),
            bet_amount: Credits::new(amount),
            game_id: "classic-fruits".to_string(),
            bet_options: None,
        }
    }

    #[test]
    fn test_paytable() {
        let three = |s: &str| vec![s.to_string(), s.to_string(), s.to_string()];
        assert_eq!(paytable_multiplier(&three("seven")), 100.0);
        assert_eq!(paytable_multiplier(&three("cherry")), 5.0);
        assert_eq!(
            paytable_multiplier(&["cherry".into(), "cherry".into(), "bar".into()]),
            2.0
        );
        assert_eq!(
            paytable_multiplier(&["bar".into(), "cherry".into(), "cherry".into()]),
            0.0
        );
    }

    #[test]
    fn test_inactive_game_rejected() {
        let mut house = house();
        let err = house
            .create_session(&CreateSessionRequest {
                game_id: "retired-reels".to_string(),
                bet_amount: None,
            })
            .unwrap_err();
        assert_eq!(err.code, "GAME_INACTIVE");
    }

    #[test]
    fn test_settlement_balances_add_up() {
        let mut house = house();
        let session_id = open(&mut house);

        for _ in 0..20 {
            let response = house.place_bet(&bet(&session_id, 5)).unwrap();
            let PlaceBetResponse::Settled(s) = response else {
                panic!("expected inline settlement");
            };
            assert_eq!(
                s.balance_after.as_i64(),
                s.balance_before.as_i64() - 5 + s.win_amount.as_i64()
            );
        }
        assert_eq!(house.wallet_balance().balance, house.balance());
    }

    #[test]
    fn test_bet_against_ended_session() {
        let mut house = house();
        let session_id = open(&mut house);
        house
            .end_session(&EndSessionRequest {
                session_id: session_id.clone(),
            })
            .unwrap();

        let err = house.place_bet(&bet(&session_id, 5)).unwrap_err();
        assert_eq!(err.code, "SESSION_NOT_FOUND");
    }

    #[test]
    fn test_insufficient_funds() {
        let mut house = house();
        let session_id = open(&mut house);
        let err = house.place_bet(&bet(&session_id, 500)).unwrap_err();
        assert_eq!(err.code, "INSUFFICIENT_FUNDS");
        assert_eq!(house.balance(), Credits::new(100));
    }

    #[test]
    fn test_deferred_settlement_requires_polls() {
        let mut house = house();
        house.set_deferred_settlement(Some(2));
        let session_id = open(&mut house);

        let response = house.place_bet(&bet(&session_id, 5)).unwrap();
        let round_id = response.round_id().to_string();
        assert!(matches!(response, PlaceBetResponse::Pending(_)));

        assert!(matches!(house.fetch_bet(&round_id).unwrap(), PlaceBetResponse::Pending(_)));
        assert!(matches!(house.fetch_bet(&round_id).unwrap(), PlaceBetResponse::Pending(_)));
        assert!(matches!(house.fetch_bet(&round_id).unwrap(), PlaceBetResponse::Settled(_)));
    }

    #[test]
    fn test_history_newest_first_and_paged() {
        let mut house = house();
        let session_id = open(&mut house);
        let mut ids = Vec::new();
        for _ in 0..5 {
            house.script_spin(ScriptedSpin::loss());
            ids.push(house.place_bet(&bet(&session_id, 1)).unwrap().round_id().to_string());
        }
        ids.reverse();

        let query = |page| HistoryQuery {
            page,
            page_size: 2,
            game_id: None,
            start_date: None,
            end_date: None,
        };
        let first = house.history(&query(1)).unwrap();
        assert_eq!(first.total_count, 5);
        assert_eq!(first.items[0].round_id, ids[0]);
        let third = house.history(&query(3)).unwrap();
        assert_eq!(third.items.len(), 1);
        assert_eq!(third.items[0].round_id, ids[4]);

        assert!(house.history(&query(0)).is_err());
    }
}
