//! Render-ready view of the wagering core
//!
//! Everything here is derived on demand from the session, bet and balance
//! state. The view model makes no network calls and keeps no state of its own.

use serde::Serialize;
use shared::Credits;
use std::sync::Arc;

use crate::domain::BetLifecycleState;
use crate::history::HistoryPaginator;
use crate::orchestrator::BetOrchestrator;
use crate::reconciliation::BalanceReconciler;
use crate::session::{SessionManager, SessionState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameView {
    pub reels: Vec<String>,
    pub is_spinning: bool,
    pub win_amount: Credits,
    /// Authoritative balance, `None` before the first server read
    pub balance: Option<Credits>,
    /// Balance minus the in-flight stake; display only
    pub predicted_balance: Option<Credits>,
    pub hint: Option<String>,
    pub session_active: bool,
}

pub struct GameViewModel {
    sessions: Arc<SessionManager>,
    orchestrator: Arc<BetOrchestrator>,
    balance: Arc<BalanceReconciler>,
    history: Arc<HistoryPaginator>,
}

impl GameViewModel {
    pub fn new(
        sessions: Arc<SessionManager>,
        orchestrator: Arc<BetOrchestrator>,
        balance: Arc<BalanceReconciler>,
        history: Arc<HistoryPaginator>,
    ) -> Self {
        Self {
            sessions,
            orchestrator,
            balance,
            history,
        }
    }

    pub fn snapshot(&self) -> GameView {
        let bet = self.orchestrator.state();
        let session = self.sessions.state();
        let balance = self.balance.balance();

        let reels = match &bet {
            BetLifecycleState::Settled(result) => result.result_symbols.clone(),
            _ => self
                .history
                .latest()
                .map(|item| item.result_symbols)
                .unwrap_or_default(),
        };

        let win_amount = bet
            .settled()
            .map(|result| result.win_amount)
            .unwrap_or(Credits::ZERO);

        let predicted_balance = match (balance, bet.in_flight_amount()) {
            (Some(balance), Some(stake)) => balance.checked_sub(stake).ok(),
            (balance, None) => balance,
            (None, Some(_)) => None,
        };

        GameView {
            reels,
            is_spinning: bet.is_in_flight(),
            win_amount,
            balance,
            predicted_balance,
            hint: hint(&bet, &session),
            session_active: matches!(session, SessionState::Active(_)),
        }
    }
}

fn hint(bet: &BetLifecycleState, session: &SessionState) -> Option<String> {
    match bet {
        BetLifecycleState::Failed(kind) => return Some(kind.user_message().to_string()),
        BetLifecycleState::Placing(_) | BetLifecycleState::AwaitingResult { .. } => {
            return Some("Spinning...".to_string())
        }
        BetLifecycleState::Settled(result) if result.is_win => {
            return Some(format!("You won {}!", result.win_amount))
        }
        _ => {}
    }

    match session {
        SessionState::NoSession | SessionState::Ended(_) => Some("Open a game to start playing.".to_string()),
        SessionState::Pending { .. } => Some("Opening game...".to_string()),
        SessionState::Invalid(_) => Some("Your session expired. Reopen the game to continue.".to_string()),
        SessionState::Active(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BetRequest, GameId};
    use crate::events::EventBus;
    use crate::executor::{Endpoint, FixtureExecutor, FixtureFault, ScriptedSpin};
    use crate::retry_strategy::ResultPollStrategy;
    use std::time::Duration;

    struct Harness {
        executor: Arc<FixtureExecutor>,
        sessions: Arc<SessionManager>,
        orchestrator: Arc<BetOrchestrator>,
        history: Arc<HistoryPaginator>,
        view: GameViewModel,
    }

    fn harness() -> Harness {
        let executor = Arc::new(FixtureExecutor::default());
        let events = EventBus::new();
        let balance = Arc::new(BalanceReconciler::new(events.clone()));
        let sessions = Arc::new(SessionManager::new(executor.clone(), balance.clone(), events.clone()));
        let history = Arc::new(HistoryPaginator::new(executor.clone(), events.clone(), 20));
        let orchestrator = Arc::new(BetOrchestrator::new(
            executor.clone(),
            sessions.clone(),
            balance.clone(),
            history.clone(),
            events,
            ResultPollStrategy::default(),
        ));
        let view = GameViewModel::new(sessions.clone(), orchestrator.clone(), balance, history.clone());

        Harness {
            executor,
            sessions,
            orchestrator,
            history,
            view,
        }
    }

    #[tokio::test]
    async fn test_view_before_session() {
        let h = harness();

        let view = h.view.snapshot();

        assert!(!view.session_active);
        assert!(!view.is_spinning);
        assert!(view.reels.is_empty());
        assert_eq!(view.balance, None);
        assert!(view.hint.is_some());
    }

    #[tokio::test]
    async fn test_view_while_spinning_predicts_balance() {
        let h = harness();
        let session = h.sessions.ensure_session(&GameId::from("classic-fruits"), None).await.unwrap();
        h.executor.set_latency(Duration::from_millis(100));
        h.executor.script_spin(ScriptedSpin::win(40));

        let orchestrator = h.orchestrator.clone();
        let spin = tokio::spawn(async move {
            orchestrator
                .place_bet(BetRequest::new(&session, Credits::new(10)))
                .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let spinning = h.view.snapshot();
        assert!(spinning.is_spinning);
        assert_eq!(spinning.balance, Some(Credits::new(1000)));
        assert_eq!(spinning.predicted_balance, Some(Credits::new(990)));
        assert_eq!(spinning.win_amount, Credits::ZERO);

        spin.await.unwrap().unwrap();
        let settled = h.view.snapshot();
        assert!(!settled.is_spinning);
        assert_eq!(settled.win_amount, Credits::new(40));
        assert_eq!(settled.balance, Some(Credits::new(1030)));
        assert_eq!(settled.predicted_balance, settled.balance);
        assert_eq!(settled.reels, vec!["seven", "seven", "seven"]);
    }

    #[tokio::test]
    async fn test_failure_hint_and_history_reels() {
        let h = harness();
        let session = h.sessions.ensure_session(&GameId::from("classic-fruits"), None).await.unwrap();
        h.executor.script_spin(ScriptedSpin::loss());
        h.orchestrator
            .place_bet(BetRequest::new(&session, Credits::new(10)))
            .await
            .unwrap();
        h.history.load_page(1, 20, None).await.unwrap();

        h.orchestrator.acknowledge();
        h.executor.fail_next(Endpoint::PlaceBet, FixtureFault::Timeout);
        h.orchestrator
            .place_bet(BetRequest::new(&session, Credits::new(10)))
            .await
            .unwrap();

        let view = h.view.snapshot();
        assert_eq!(view.hint.as_deref(), Some(crate::errors::FailureKind::Network.user_message()));
        assert_eq!(view.win_amount, Credits::ZERO);
        assert_eq!(view.reels, vec!["cherry", "bell", "seven"]);
    }
}
