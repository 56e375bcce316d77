//! Single-flight bet lifecycle
//!
//! `Idle -> Placing -> (AwaitingResult ->) Settled | Failed`. Admission is a
//! synchronous check-and-set under one lock, so two concurrent `place_bet`
//! calls can never both pass. The network phase runs on its own task: a
//! caller that stops waiting does not abort a bet the server may already
//! have accepted.

use parking_lot::Mutex;
use shared::api::{PlaceBetRequest, PlaceBetResponse};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::domain::{BetId, BetLifecycleState, BetRequest, BetResult};
use crate::errors::{FailureKind, GameError, Result, SessionError, ValidationError};
use crate::events::{EventBus, GameEvent};
use crate::executor::{ExecutorError, RequestExecutor};
use crate::history::HistoryPaginator;
use crate::reconciliation::BalanceReconciler;
use crate::retry_strategy::ResultPollStrategy;
use crate::session::SessionManager;

pub struct BetOrchestrator {
    executor: Arc<dyn RequestExecutor>,
    sessions: Arc<SessionManager>,
    balance: Arc<BalanceReconciler>,
    history: Arc<HistoryPaginator>,
    events: EventBus,
    poll: ResultPollStrategy,
    state: Mutex<BetLifecycleState>,
}

impl BetOrchestrator {
    pub fn new(
        executor: Arc<dyn RequestExecutor>,
        sessions: Arc<SessionManager>,
        balance: Arc<BalanceReconciler>,
        history: Arc<HistoryPaginator>,
        events: EventBus,
        poll: ResultPollStrategy,
    ) -> Self {
        Self {
            executor,
            sessions,
            balance,
            history,
            events,
            poll,
            state: Mutex::new(BetLifecycleState::Idle),
        }
    }

    pub fn state(&self) -> BetLifecycleState {
        self.state.lock().clone()
    }

    /// Submit `request` and wait for it to settle or fail
    ///
    /// Returns `Err` only when the bet was not admitted; no request is sent
    /// in that case. Once admitted, the outcome is the returned
    /// `Settled` or `Failed` state. Nothing here is retried.
    pub async fn place_bet(self: &Arc<Self>, request: BetRequest) -> Result<BetLifecycleState> {
        self.admit(&request).inspect_err(|e| {
            debug!(error = %e, "Bet not admitted");
            metrics::counter!("bets_rejected_total", "reason" => rejection_reason(e)).increment(1);
        })?;

        info!(
            session_id = %request.session_id(),
            game_id = %request.game_id(),
            amount = %request.amount(),
            "Bet admitted"
        );
        metrics::counter!("bets_admitted_total").increment(1);
        self.events.publish(GameEvent::BetAdmitted {
            session_id: request.session_id().clone(),
            amount: request.amount(),
        });

        let orchestrator = Arc::clone(self);
        let network = tokio::spawn(async move { orchestrator.submit(request).await });

        match network.await {
            Ok(state) => Ok(state),
            Err(e) => {
                error!(error = %e, "Bet task ended unexpectedly");
                Ok(self.fail(FailureKind::Unknown))
            }
        }
    }

    /// Clear a `Settled` or `Failed` outcome back to `Idle`
    ///
    /// Returns false while a bet is in flight.
    pub fn acknowledge(&self) -> bool {
        let mut state = self.state.lock();
        if state.is_in_flight() {
            return false;
        }
        *state = BetLifecycleState::Idle;
        true
    }

    fn admit(&self, request: &BetRequest) -> Result<()> {
        let amount = request.amount();
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount { amount }.into());
        }

        let mut state = self.state.lock();
        match &*state {
            BetLifecycleState::Idle | BetLifecycleState::Settled(_) => {}
            other => {
                return Err(GameError::ConcurrentBet {
                    state: other.name(),
                })
            }
        }

        let session = self.sessions.active_session()?;
        if request.game_id() != &session.game_id {
            return Err(ValidationError::GameMismatch {
                requested: request.game_id().clone(),
                active: session.game_id,
            }
            .into());
        }
        if request.session_id() != &session.session_id {
            return Err(SessionError::Stale {
                requested: request.session_id().clone(),
                active: session.session_id,
            }
            .into());
        }

        let available = self.balance.available();
        if amount > available {
            return Err(ValidationError::InsufficientBalance {
                required: amount,
                available,
            }
            .into());
        }

        *state = BetLifecycleState::Placing(request.clone());
        Ok(())
    }

    async fn submit(&self, request: BetRequest) -> BetLifecycleState {
        let started = Instant::now();
        let wire = PlaceBetRequest {
            session_id: request.session_id().to_string(),
            bet_amount: request.amount(),
            game_id: request.game_id().to_string(),
            bet_options: request.options().cloned(),
        };

        let settlement = match self.executor.place_bet(&wire).await {
            Ok(response) => {
                self.accept(&request, response.round_id());
                match response {
                    PlaceBetResponse::Settled(settlement) => Ok(settlement),
                    PlaceBetResponse::Pending(pending) => {
                        debug!(round_id = %pending.round_id, "Bet accepted, awaiting settlement");
                        self.poll
                            .await_settlement(self.executor.as_ref(), &pending.round_id)
                            .await
                    }
                }
            }
            Err(e) => Err(e),
        };

        metrics::histogram!("bet_round_trip_seconds").record(started.elapsed().as_secs_f64());

        match settlement {
            Ok(settlement) => self.settle(BetResult::from(settlement)),
            Err(e) => self.reject(&request, e),
        }
    }

    /// The server holds the round from here on, whether or not it settled inline
    fn accept(&self, request: &BetRequest, round_id: &str) {
        let round_id = BetId::new(round_id);
        *self.state.lock() = BetLifecycleState::AwaitingResult {
            request: request.clone(),
            round_id: round_id.clone(),
        };
        self.events.publish(GameEvent::BetAccepted { round_id });
    }

    fn settle(&self, result: BetResult) -> BetLifecycleState {
        // Balance first, then history, then the state observers react to
        let warnings = self.balance.apply(&result);
        self.history.invalidate();
        let settled = BetLifecycleState::Settled(result.clone());
        *self.state.lock() = settled.clone();

        info!(
            bet_id = %result.bet_id,
            is_win = result.is_win,
            win_amount = %result.win_amount,
            new_balance = %result.new_balance,
            warnings = warnings.len(),
            "Bet settled"
        );
        metrics::counter!("bets_settled_total").increment(1);
        self.events.publish(GameEvent::BetSettled(result));
        settled
    }

    fn reject(&self, request: &BetRequest, error: ExecutorError) -> BetLifecycleState {
        let kind = FailureKind::from(&error);
        warn!(
            session_id = %request.session_id(),
            amount = %request.amount(),
            kind = %kind,
            error = %error,
            "Bet failed"
        );

        if kind == FailureKind::SessionExpired {
            self.sessions.invalidate(request.session_id());
        }
        self.fail(kind)
    }

    fn fail(&self, kind: FailureKind) -> BetLifecycleState {
        let failed = BetLifecycleState::Failed(kind);
        *self.state.lock() = failed.clone();
        metrics::counter!("bets_failed_total", "kind" => kind.as_str()).increment(1);
        self.events.publish(GameEvent::BetFailed(kind));
        failed
    }
}

fn rejection_reason(error: &GameError) -> &'static str {
    match error {
        GameError::Validation(ValidationError::NonPositiveAmount { .. }) => "non_positive_amount",
        GameError::Validation(ValidationError::InsufficientBalance { .. }) => "insufficient_balance",
        GameError::Validation(ValidationError::GameMismatch { .. }) => "game_mismatch",
        GameError::Validation(_) => "validation",
        GameError::Session(_) => "session",
        GameError::ConcurrentBet { .. } => "concurrent_bet",
        GameError::Network(_) | GameError::ServerRejected { .. } => "server",
    }
}
