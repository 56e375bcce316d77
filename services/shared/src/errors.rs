/// Shared error envelope for the game REST surface
///
/// Design Philosophy:
/// - Servers answer every failed request with `{"error": ServiceError}`
/// - Clients classify failures by `code`, never by parsing `message`
/// - Categories map to HTTP status codes and logging severity
///
/// Error codes follow the pattern: <CATEGORY>_<SPECIFIC>
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error categories that map to HTTP status codes and logging severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Client provided invalid input (400 Bad Request)
    Validation,

    /// Session missing, ended or expired (404 Not Found / 410 Gone)
    Session,

    /// Wallet cannot cover the request (402 Payment Required)
    Funds,

    /// Resource not found (404 Not Found)
    NotFound,

    /// Missing or invalid bearer token (401 Unauthorized)
    Unauthorized,

    /// Game exists but is not accepting play (409 Conflict)
    Unavailable,

    /// Unexpected failures (500 Internal Server Error)
    Internal,
}

impl ErrorCategory {
    /// Map error category to HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::Validation => 400,
            ErrorCategory::Session => 404,
            ErrorCategory::Funds => 402,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Unauthorized => 401,
            ErrorCategory::Unavailable => 409,
            ErrorCategory::Internal => 500,
        }
    }

    /// Map error category to log level
    pub fn log_level(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "warn",
            ErrorCategory::Session => "info",
            ErrorCategory::Funds => "info",
            ErrorCategory::NotFound => "info",
            ErrorCategory::Unauthorized => "warn",
            ErrorCategory::Unavailable => "warn",
            ErrorCategory::Internal => "error",
        }
    }
}

/// Standard error codes shared by client and server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    // Validation errors
    pub const VALIDATION_INVALID_AMOUNT: ErrorCode = ErrorCode("VALIDATION_INVALID_AMOUNT");
    pub const VALIDATION_INVALID_PAGE: ErrorCode = ErrorCode("VALIDATION_INVALID_PAGE");
    pub const VALIDATION_INVALID_INPUT: ErrorCode = ErrorCode("VALIDATION_INVALID_INPUT");

    // Session errors
    pub const SESSION_NOT_FOUND: ErrorCode = ErrorCode("SESSION_NOT_FOUND");
    pub const SESSION_EXPIRED: ErrorCode = ErrorCode("SESSION_EXPIRED");
    pub const SESSION_ENDED: ErrorCode = ErrorCode("SESSION_ENDED");

    // Game errors
    pub const GAME_NOT_FOUND: ErrorCode = ErrorCode("GAME_NOT_FOUND");
    pub const GAME_INACTIVE: ErrorCode = ErrorCode("GAME_INACTIVE");

    // Wallet errors
    pub const INSUFFICIENT_FUNDS: ErrorCode = ErrorCode("INSUFFICIENT_FUNDS");

    // Resource errors
    pub const NOT_FOUND_BET: ErrorCode = ErrorCode("NOT_FOUND_BET");

    // Auth errors
    pub const UNAUTHORIZED: ErrorCode = ErrorCode("UNAUTHORIZED");

    // Internal errors
    pub const INTERNAL_UNEXPECTED: ErrorCode = ErrorCode("INTERNAL_UNEXPECTED");

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Whether this code means the server no longer recognizes the session
    pub fn is_session_loss(code: &str) -> bool {
        code == Self::SESSION_NOT_FOUND.0
            || code == Self::SESSION_EXPIRED.0
            || code == Self::SESSION_ENDED.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standardized error structure carried in the `error` field of failed responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceError {
    /// Error category (determines status code and log level)
    pub category: ErrorCategory,

    /// Structured error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context (e.g., field names, IDs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ServiceError {
    pub fn new(category: ErrorCategory, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            category,
            code: code.as_str().to_string(),
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn status_code(&self) -> u16 {
        self.category.status_code()
    }

    pub fn invalid_amount(amount: i64, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INVALID_AMOUNT,
            format!("Invalid amount: {}", amount),
        )
        .with_context(reason)
    }

    pub fn invalid_page(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INVALID_PAGE,
            "Invalid page request",
        )
        .with_context(reason)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INVALID_INPUT,
            message,
        )
    }

    pub fn session_not_found(session_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Session,
            ErrorCode::SESSION_NOT_FOUND,
            format!("Session not found: {}", session_id),
        )
    }

    pub fn game_not_found(game_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::NotFound,
            ErrorCode::GAME_NOT_FOUND,
            format!("Game not found: {}", game_id),
        )
    }

    pub fn game_inactive(game_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Unavailable,
            ErrorCode::GAME_INACTIVE,
            format!("Game is not active: {}", game_id),
        )
    }

    pub fn insufficient_funds(required: i64, available: i64) -> Self {
        Self::new(
            ErrorCategory::Funds,
            ErrorCode::INSUFFICIENT_FUNDS,
            "Insufficient funds",
        )
        .with_context(format!("required: {}, available: {}", required, available))
    }

    pub fn bet_not_found(round_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::NotFound,
            ErrorCode::NOT_FOUND_BET,
            format!("Bet not found: {}", round_id),
        )
    }

    pub fn unauthorized() -> Self {
        Self::new(
            ErrorCategory::Unauthorized,
            ErrorCode::UNAUTHORIZED,
            "Missing or invalid bearer token",
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Internal, ErrorCode::INTERNAL_UNEXPECTED, message)
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "[{}] {}: {}", self.code, self.message, context)
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ServiceError {}

/// Body of every non-2xx response: `{"error": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ServiceError,
}

impl From<ServiceError> for ErrorEnvelope {
    fn from(error: ServiceError) -> Self {
        Self { error }
    }
}
