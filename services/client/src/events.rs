//! State-transition events published by the wagering core
//!
//! Publishing never blocks: with no subscribers the event is dropped, and a
//! subscriber that falls behind skips ahead (`RecvError::Lagged`).

use shared::Credits;
use tokio::sync::broadcast;

use crate::domain::{BetId, BetResult, Session, SessionId};
use crate::errors::FailureKind;
use crate::reconciliation::ReconciliationWarning;

const EVENT_CAPACITY: usize = 256;

/// Which write path changed the authoritative balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceSource {
    SessionStart,
    WalletFetch,
    Settlement,
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SessionOpened(Session),
    SessionEnded(SessionId),
    SessionInvalidated(SessionId),
    BetAdmitted { session_id: SessionId, amount: Credits },
    /// The server took the bet and assigned it a round
    BetAccepted { round_id: BetId },
    BetSettled(BetResult),
    BetFailed(FailureKind),
    BalanceChanged { balance: Credits, source: BalanceSource },
    HistoryInvalidated,
    ReconciliationWarning(ReconciliationWarning),
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GameEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, event: GameEvent) {
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
