//! Game-session and wagering core of the slot client
//!
//! Opens play sessions, submits one bet at a time, reconciles the balance
//! with the server's settlement and keeps a paginated bet history consistent
//! while a spin is in flight. All backend traffic goes through
//! [`executor::RequestExecutor`].

pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod executor;
pub mod game;
pub mod history;
pub mod orchestrator;
pub mod reconciliation;
pub mod retry_strategy;
pub mod session;
pub mod view_model;

pub use config::Config;
pub use domain::{
    BetId, BetLifecycleState, BetRequest, BetResult, GameId, HistoryFilter, HistoryPage, Session,
    SessionId,
};
pub use errors::{FailureKind, GameError, SessionError, ValidationError};
pub use events::{BalanceSource, EventBus, GameEvent};
pub use game::GameClient;
pub use history::HistoryPaginator;
pub use orchestrator::BetOrchestrator;
pub use reconciliation::{BalanceReconciler, ReconciliationIssue, ReconciliationWarning};
pub use session::{SessionManager, SessionState};
pub use view_model::{GameView, GameViewModel};
