//! Fixture-backed executor
//!
//! Serves every call from an in-process [`FixtureHouse`]. Tests drive it
//! through scripted spins, injected faults and latency, and read back
//! per-endpoint call counts to prove which calls never reached the network.

mod house;

pub use house::{paytable_multiplier, FixtureHouse, ScriptedSpin, GAMES, SYMBOLS};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::api::{
    CreateSessionRequest, EndSessionRequest, HistoryQuery, HistoryResponse, PlaceBetRequest,
    PlaceBetResponse, SessionResponse, WalletBalanceResponse, WalletTransferRequest,
    WalletTransferResponse,
};
use shared::errors::ServiceError;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{ExecutorError, RequestExecutor};
use crate::config::FixtureSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    CreateSession,
    EndSession,
    PlaceBet,
    FetchBet,
    BetHistory,
    WalletBalance,
    Deposit,
    Withdraw,
}

/// Failure injected in place of the next call to an endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum FixtureFault {
    Timeout,
    Transport,
    Reject(ServiceError),
}

impl From<FixtureFault> for ExecutorError {
    fn from(fault: FixtureFault) -> Self {
        match fault {
            FixtureFault::Timeout => ExecutorError::Timeout,
            FixtureFault::Transport => ExecutorError::Transport("connection reset by fixture".to_string()),
            FixtureFault::Reject(error) => ExecutorError::from(error),
        }
    }
}

pub struct FixtureExecutor {
    house: Mutex<FixtureHouse>,
    faults: Mutex<HashMap<Endpoint, VecDeque<FixtureFault>>>,
    calls: Mutex<HashMap<Endpoint, usize>>,
    latency: Mutex<Duration>,
    authenticated: AtomicBool,
}

impl FixtureExecutor {
    pub fn new(settings: FixtureSettings) -> Self {
        let mut house = FixtureHouse::new(settings.seed, settings.initial_balance);
        if settings.deferred_settlement {
            house.set_deferred_settlement(Some(1));
        }

        Self {
            house: Mutex::new(house),
            faults: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            latency: Mutex::new(Duration::ZERO),
            authenticated: AtomicBool::new(true),
        }
    }

    /// Run `f` against the simulated backend, bypassing faults and counters
    pub fn with_house<R>(&self, f: impl FnOnce(&mut FixtureHouse) -> R) -> R {
        f(&mut self.house.lock())
    }

    pub fn script_spin(&self, spin: ScriptedSpin) {
        self.house.lock().script_spin(spin);
    }

    pub fn fail_next(&self, endpoint: Endpoint, fault: FixtureFault) {
        self.faults.lock().entry(endpoint).or_default().push_back(fault);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls.lock().get(&endpoint).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    async fn call<T, F>(&self, endpoint: Endpoint, op: F) -> Result<T, ExecutorError>
    where
        T: Send,
        F: FnOnce(&mut FixtureHouse) -> Result<T, ServiceError> + Send,
    {
        *self.calls.lock().entry(endpoint).or_insert(0) += 1;

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let fault = self
            .faults
            .lock()
            .get_mut(&endpoint)
            .and_then(|queue| queue.pop_front());
        if let Some(fault) = fault {
            tracing::debug!(?endpoint, ?fault, "Fixture fault injected");
            return Err(fault.into());
        }

        let mut house = self.house.lock();
        op(&mut house).map_err(ExecutorError::from)
    }
}

impl Default for FixtureExecutor {
    fn default() -> Self {
        Self::new(FixtureSettings::default())
    }
}

#[async_trait]
impl RequestExecutor for FixtureExecutor {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    async fn create_session(&self, req: &CreateSessionRequest) -> Result<SessionResponse, ExecutorError> {
        self.call(Endpoint::CreateSession, |house| house.create_session(req))
            .await
    }

    async fn end_session(&self, req: &EndSessionRequest) -> Result<(), ExecutorError> {
        self.call(Endpoint::EndSession, |house| house.end_session(req))
            .await
    }

    async fn place_bet(&self, req: &PlaceBetRequest) -> Result<PlaceBetResponse, ExecutorError> {
        self.call(Endpoint::PlaceBet, |house| house.place_bet(req)).await
    }

    async fn fetch_bet(&self, round_id: &str) -> Result<PlaceBetResponse, ExecutorError> {
        self.call(Endpoint::FetchBet, |house| house.fetch_bet(round_id))
            .await
    }

    async fn bet_history(&self, query: &HistoryQuery) -> Result<HistoryResponse, ExecutorError> {
        self.call(Endpoint::BetHistory, |house| house.history(query))
            .await
    }

    async fn wallet_balance(&self) -> Result<WalletBalanceResponse, ExecutorError> {
        self.call(Endpoint::WalletBalance, |house| Ok(house.wallet_balance()))
            .await
    }

    async fn deposit(&self, req: &WalletTransferRequest) -> Result<WalletTransferResponse, ExecutorError> {
        self.call(Endpoint::Deposit, |house| house.deposit(req)).await
    }

    async fn withdraw(&self, req: &WalletTransferRequest) -> Result<WalletTransferResponse, ExecutorError> {
        self.call(Endpoint::Withdraw, |house| house.withdraw(req)).await
    }
}
