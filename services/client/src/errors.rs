use serde::Serialize;
use shared::errors::ErrorCode;
use shared::Credits;

use crate::domain::{GameId, SessionId};
use crate::executor::ExecutorError;

/// Why an admitted bet ended in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    SessionExpired,
    InsufficientFunds,
    ServerRejected,
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::SessionExpired => "session_expired",
            FailureKind::InsufficientFunds => "insufficient_funds",
            FailureKind::ServerRejected => "server_rejected",
            FailureKind::Unknown => "unknown",
        }
    }

    /// Short text for a dismissable notification
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureKind::Network => "Connection problem. Your bet was not confirmed, try again.",
            FailureKind::SessionExpired => "Your game session expired. Reopen the game to continue.",
            FailureKind::InsufficientFunds => "Not enough balance for this bet.",
            FailureKind::ServerRejected => "The bet was rejected by the server.",
            FailureKind::Unknown => "Something went wrong with this bet.",
        }
    }
}

impl From<&ExecutorError> for FailureKind {
    fn from(error: &ExecutorError) -> Self {
        match error {
            ExecutorError::Timeout | ExecutorError::Transport(_) => FailureKind::Network,
            ExecutorError::Rejected { status, code, .. } => {
                if ErrorCode::is_session_loss(code) || *status == 401 {
                    FailureKind::SessionExpired
                } else if code == ErrorCode::INSUFFICIENT_FUNDS.as_str() {
                    FailureKind::InsufficientFunds
                } else {
                    FailureKind::ServerRejected
                }
            }
            ExecutorError::Decode(_) => FailureKind::Unknown,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bad client input, detected before any network call
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Credits },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Credits, available: Credits },

    #[error("bet is for game {requested} but the active session plays {active}")]
    GameMismatch { requested: GameId, active: GameId },

    #[error("page must be at least 1, got {page}")]
    InvalidPage { page: u32 },

    #[error("page size must be between 1 and {max}, got {page_size}")]
    InvalidPageSize { page_size: u32, max: u32 },
}

/// Session creation failures and bets against a session that is not active
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("no auth token available")]
    Unauthenticated,

    #[error("no active session")]
    NoSession,

    #[error("session {session_id} has ended")]
    Ended { session_id: SessionId },

    #[error("session {session_id} is no longer valid on the server")]
    Invalid { session_id: SessionId },

    #[error("bet targets session {requested} but the active session is {active}")]
    Stale { requested: SessionId, active: SessionId },

    #[error("server refused session [{code}]: {message}")]
    Rejected { code: String, message: String },

    #[error("session request failed: {0}")]
    Network(String),
}

impl From<ExecutorError> for SessionError {
    fn from(error: ExecutorError) -> Self {
        match error {
            ExecutorError::Rejected { code, message, .. } => SessionError::Rejected { code, message },
            other => SessionError::Network(other.to_string()),
        }
    }
}

/// Top-level error of the wagering core
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GameError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("a bet is already {state}; acknowledge or wait before betting again")]
    ConcurrentBet { state: &'static str },

    #[error("network error: {0}")]
    Network(String),

    #[error("server rejected request ({status}) [{code}]: {message}")]
    ServerRejected {
        status: u16,
        code: String,
        message: String,
    },
}

impl From<ExecutorError> for GameError {
    fn from(error: ExecutorError) -> Self {
        match error {
            ExecutorError::Rejected {
                status,
                code,
                message,
            } => GameError::ServerRejected {
                status,
                code,
                message,
            },
            other => GameError::Network(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16, code: &str) -> ExecutorError {
        ExecutorError::Rejected {
            status,
            code: code.to_string(),
            message: "nope".to_string(),
        }
    }

    #[test]
    fn test_failure_kind_classification() {
        assert_eq!(FailureKind::from(&ExecutorError::Timeout), FailureKind::Network);
        assert_eq!(
            FailureKind::from(&ExecutorError::Transport("reset".into())),
            FailureKind::Network
        );
        assert_eq!(
            FailureKind::from(&rejected(404, "SESSION_NOT_FOUND")),
            FailureKind::SessionExpired
        );
        assert_eq!(
            FailureKind::from(&rejected(401, "HTTP_401")),
            FailureKind::SessionExpired
        );
        assert_eq!(
            FailureKind::from(&rejected(402, "INSUFFICIENT_FUNDS")),
            FailureKind::InsufficientFunds
        );
        assert_eq!(
            FailureKind::from(&rejected(500, "INTERNAL_UNEXPECTED")),
            FailureKind::ServerRejected
        );
        assert_eq!(
            FailureKind::from(&ExecutorError::Decode("eof".into())),
            FailureKind::Unknown
        );
    }

    #[test]
    fn test_session_error_from_rejection() {
        let error = SessionError::from(rejected(409, "GAME_INACTIVE"));
        assert!(matches!(error, SessionError::Rejected { ref code, .. } if code == "GAME_INACTIVE"));

        let error = SessionError::from(ExecutorError::Timeout);
        assert!(matches!(error, SessionError::Network(_)));
    }
}
