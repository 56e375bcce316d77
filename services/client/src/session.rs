//! Play-session lifecycle
//!
//! `NoSession -> Pending -> Active -> (Ended | Invalid)`. At most one session
//! exists at a time; opening a session for another game ends the current one.

use parking_lot::Mutex;
use shared::api::{CreateSessionRequest, EndSessionRequest};
use shared::Credits;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::{GameId, Session, SessionId};
use crate::errors::SessionError;
use crate::events::{BalanceSource, EventBus, GameEvent};
use crate::executor::RequestExecutor;
use crate::reconciliation::BalanceReconciler;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    NoSession,
    Pending { game_id: GameId },
    Active(Session),
    Ended(Session),
    Invalid(Session),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::NoSession => "no_session",
            SessionState::Pending { .. } => "pending",
            SessionState::Active(_) => "active",
            SessionState::Ended(_) => "ended",
            SessionState::Invalid(_) => "invalid",
        }
    }
}

pub struct SessionManager {
    executor: Arc<dyn RequestExecutor>,
    balance: Arc<BalanceReconciler>,
    events: EventBus,
    state: Mutex<SessionState>,
    /// Serializes session creation so concurrent callers share one session
    opening: tokio::sync::Mutex<()>,
}

impl SessionManager {
    pub fn new(
        executor: Arc<dyn RequestExecutor>,
        balance: Arc<BalanceReconciler>,
        events: EventBus,
    ) -> Self {
        Self {
            executor,
            balance,
            events,
            state: Mutex::new(SessionState::NoSession),
            opening: tokio::sync::Mutex::new(()),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    /// The session bets may be placed against right now
    pub fn active_session(&self) -> Result<Session, SessionError> {
        match &*self.state.lock() {
            SessionState::Active(session) => Ok(session.clone()),
            SessionState::NoSession | SessionState::Pending { .. } => Err(SessionError::NoSession),
            SessionState::Ended(session) => Err(SessionError::Ended {
                session_id: session.session_id.clone(),
            }),
            SessionState::Invalid(session) => Err(SessionError::Invalid {
                session_id: session.session_id.clone(),
            }),
        }
    }

    /// Return the active session for `game_id`, opening one if needed
    ///
    /// Idempotent: an active session for the same game is returned unchanged.
    /// Server rejections are returned as-is; nothing is retried.
    pub async fn ensure_session(
        &self,
        game_id: &GameId,
        seed_bet_amount: Option<Credits>,
    ) -> Result<Session, SessionError> {
        if !self.executor.is_authenticated() {
            return Err(SessionError::Unauthenticated);
        }

        let _opening = self.opening.lock().await;

        let current = self.state();
        if let SessionState::Active(session) = &current {
            if &session.game_id == game_id {
                return Ok(session.clone());
            }
            info!(
                session_id = %session.session_id,
                from = %session.game_id,
                to = %game_id,
                "Switching games, ending current session"
            );
            self.end_current().await;
        }

        *self.state.lock() = SessionState::Pending {
            game_id: game_id.clone(),
        };

        let request = CreateSessionRequest {
            game_id: game_id.to_string(),
            bet_amount: seed_bet_amount,
        };

        let epoch = self.balance.epoch();
        match self.executor.create_session(&request).await {
            Ok(response) => {
                let session = Session::from(response);
                *self.state.lock() = SessionState::Active(session.clone());
                self.balance.seed_if_unchanged(
                    epoch,
                    session.initial_balance,
                    BalanceSource::SessionStart,
                );

                info!(
                    session_id = %session.session_id,
                    game_id = %session.game_id,
                    initial_balance = %session.initial_balance,
                    "Session opened"
                );
                self.events.publish(GameEvent::SessionOpened(session.clone()));
                Ok(session)
            }
            Err(e) => {
                *self.state.lock() = SessionState::NoSession;
                warn!(game_id = %game_id, error = %e, "Session creation failed");
                Err(SessionError::from(e))
            }
        }
    }

    /// Invalidate the local handle, then tell the server on a best-effort basis
    ///
    /// A bet already in flight is not cancelled; only the next bet fails.
    /// Called while a session is still being created, it waits for the
    /// creation to resolve and ends whatever it produced.
    pub async fn end_session(&self) {
        let _opening = self.opening.lock().await;
        self.end_current().await;
    }

    async fn end_current(&self) {
        let ended = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, SessionState::NoSession) {
                SessionState::Active(session) | SessionState::Invalid(session) => {
                    *state = SessionState::Ended(session.clone());
                    Some(session)
                }
                other => {
                    *state = other;
                    None
                }
            }
        };

        let Some(session) = ended else {
            debug!("end_session called with no open session");
            return;
        };

        info!(session_id = %session.session_id, "Session ended");
        self.events
            .publish(GameEvent::SessionEnded(session.session_id.clone()));

        let request = EndSessionRequest {
            session_id: session.session_id.to_string(),
        };
        if let Err(e) = self.executor.end_session(&request).await {
            warn!(
                session_id = %session.session_id,
                error = %e,
                "Failed to notify server of session end"
            );
        }
    }

    /// Mark the session invalid after the server stopped recognizing it
    ///
    /// Ignored unless `session_id` is still the active session.
    pub fn invalidate(&self, session_id: &SessionId) {
        {
            let mut state = self.state.lock();
            let session = match &*state {
                SessionState::Active(session) if &session.session_id == session_id => session.clone(),
                _ => return,
            };
            *state = SessionState::Invalid(session);
        }

        warn!(session_id = %session_id, "Session invalidated by server");
        self.events
            .publish(GameEvent::SessionInvalidated(session_id.clone()));
    }
}
