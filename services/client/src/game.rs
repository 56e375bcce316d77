//! `GameClient`: the wagering core wired together behind one handle

use shared::api::{BetOptions, WalletBalanceResponse, WalletTransferRequest, WalletTransferResponse};
use shared::Credits;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::{Config, HistoryConfig, WageringConfig};
use crate::domain::{BetLifecycleState, BetRequest, GameId, HistoryFilter, HistoryPage, Session};
use crate::errors::{Result, ValidationError};
use crate::events::{BalanceSource, EventBus, GameEvent};
use crate::executor::{self, RequestExecutor};
use crate::history::HistoryPaginator;
use crate::orchestrator::BetOrchestrator;
use crate::reconciliation::BalanceReconciler;
use crate::retry_strategy::ResultPollStrategy;
use crate::session::{SessionManager, SessionState};
use crate::view_model::{GameView, GameViewModel};

pub struct GameClient {
    executor: Arc<dyn RequestExecutor>,
    events: EventBus,
    balance: Arc<BalanceReconciler>,
    sessions: Arc<SessionManager>,
    history: Arc<HistoryPaginator>,
    orchestrator: Arc<BetOrchestrator>,
    view: GameViewModel,
}

impl GameClient {
    pub fn new(
        executor: Arc<dyn RequestExecutor>,
        wagering: &WageringConfig,
        history: &HistoryConfig,
    ) -> Self {
        let events = EventBus::new();
        let balance = Arc::new(BalanceReconciler::new(events.clone()));
        let sessions = Arc::new(SessionManager::new(
            executor.clone(),
            balance.clone(),
            events.clone(),
        ));
        let history = Arc::new(HistoryPaginator::new(
            executor.clone(),
            events.clone(),
            history.page_size,
        ));
        let orchestrator = Arc::new(BetOrchestrator::new(
            executor.clone(),
            sessions.clone(),
            balance.clone(),
            history.clone(),
            events.clone(),
            ResultPollStrategy::from_config(wagering),
        ));
        let view = GameViewModel::new(
            sessions.clone(),
            orchestrator.clone(),
            balance.clone(),
            history.clone(),
        );

        Self {
            executor,
            events,
            balance,
            sessions,
            history,
            orchestrator,
            view,
        }
    }

    /// Build the configured executor and wire a client around it
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let executor = executor::build(&config.executor)?;
        Ok(Self::new(executor, &config.wagering, &config.history))
    }

    pub async fn ensure_session(&self, game_id: &GameId, bet_amount: Option<Credits>) -> Result<Session> {
        Ok(self.sessions.ensure_session(game_id, bet_amount).await?)
    }

    pub async fn end_session(&self) {
        self.sessions.end_session().await;
    }

    /// Bet `amount` against the active session
    pub async fn spin(&self, amount: Credits, options: Option<BetOptions>) -> Result<BetLifecycleState> {
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount { amount }.into());
        }

        let session = self.sessions.active_session()?;
        let mut request = BetRequest::new(&session, amount);
        if let Some(options) = options {
            request = request.with_options(options);
        }
        self.orchestrator.place_bet(request).await
    }

    /// Submit a prepared request, for callers that hold a session handle
    pub async fn place_bet(&self, request: BetRequest) -> Result<BetLifecycleState> {
        self.orchestrator.place_bet(request).await
    }

    pub fn acknowledge(&self) -> bool {
        self.orchestrator.acknowledge()
    }

    /// Re-read the wallet and seed the authoritative balance from it
    ///
    /// The balance is left alone while a bet is in flight, or when a
    /// settlement or transfer landed while the read was outstanding; either
    /// carries a newer value.
    pub async fn refresh_wallet(&self) -> Result<WalletBalanceResponse> {
        let epoch = self.balance.epoch();
        let wallet = self.executor.wallet_balance().await?;
        if self.orchestrator.state().is_in_flight() {
            debug!(balance = %wallet.balance, "Bet in flight, wallet balance not applied");
        } else {
            self.balance
                .seed_if_unchanged(epoch, wallet.balance, BalanceSource::WalletFetch);
        }
        Ok(wallet)
    }

    pub async fn deposit(&self, amount: Credits) -> Result<WalletTransferResponse> {
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount { amount }.into());
        }

        let confirmation = self
            .executor
            .deposit(&WalletTransferRequest { amount })
            .await?;
        self.balance
            .credit(&confirmation.transaction_id, confirmation.amount);
        info!(
            transaction_id = %confirmation.transaction_id,
            amount = %confirmation.amount,
            "Deposit confirmed"
        );
        Ok(confirmation)
    }

    pub async fn withdraw(&self, amount: Credits) -> Result<WalletTransferResponse> {
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount { amount }.into());
        }
        let available = self.balance.available();
        if amount > available {
            return Err(ValidationError::InsufficientBalance {
                required: amount,
                available,
            }
            .into());
        }

        let confirmation = self
            .executor
            .withdraw(&WalletTransferRequest { amount })
            .await?;
        self.balance
            .debit(&confirmation.transaction_id, confirmation.amount);
        info!(
            transaction_id = %confirmation.transaction_id,
            amount = %confirmation.amount,
            "Withdrawal confirmed"
        );
        Ok(confirmation)
    }

    pub async fn load_history(
        &self,
        page: u32,
        page_size: u32,
        filter: Option<HistoryFilter>,
    ) -> Result<HistoryPage> {
        self.history.load_page(page, page_size, filter).await
    }

    pub async fn load_more_history(&self) -> Result<HistoryPage> {
        self.history.load_next().await
    }

    pub async fn refresh_history(&self) -> Result<HistoryPage> {
        self.history.refresh().await
    }

    pub fn history(&self) -> HistoryPage {
        self.history.snapshot()
    }

    pub fn history_is_stale(&self) -> bool {
        self.history.is_stale()
    }

    pub fn view(&self) -> GameView {
        self.view.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.events.subscribe()
    }

    pub fn session_state(&self) -> SessionState {
        self.sessions.state()
    }

    pub fn bet_state(&self) -> BetLifecycleState {
        self.orchestrator.state()
    }

    pub fn balance(&self) -> Option<Credits> {
        self.balance.balance()
    }
}
