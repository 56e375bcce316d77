//! Transport seam between the wagering core and the game backend
//!
//! The core only talks to [`RequestExecutor`]. Which implementation backs it
//! (live HTTP or the in-memory fixture house) is decided once at startup by
//! [`build`], never branched on inline.

pub mod fixture;
pub mod http;

use async_trait::async_trait;
use shared::api::{
    CreateSessionRequest, EndSessionRequest, HistoryQuery, HistoryResponse, PlaceBetRequest,
    PlaceBetResponse, SessionResponse, WalletBalanceResponse, WalletTransferRequest,
    WalletTransferResponse,
};
use shared::errors::ServiceError;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ExecutorConfig, ExecutorMode};

pub use fixture::{Endpoint, FixtureExecutor, FixtureFault, FixtureHouse, ScriptedSpin};
pub use http::HttpExecutor;

/// Normalized transport failure
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server rejected request ({status}) [{code}]: {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<ServiceError> for ExecutorError {
    fn from(error: ServiceError) -> Self {
        ExecutorError::Rejected {
            status: error.status_code(),
            code: error.code,
            message: error.message,
        }
    }
}

/// Performs the backend calls the wagering core depends on
///
/// Implementations attach credentials and normalize every failure into an
/// [`ExecutorError`]. None of the methods retry on their own.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Whether a bearer credential is available for authenticated calls
    fn is_authenticated(&self) -> bool;

    async fn create_session(&self, req: &CreateSessionRequest) -> Result<SessionResponse, ExecutorError>;

    async fn end_session(&self, req: &EndSessionRequest) -> Result<(), ExecutorError>;

    async fn place_bet(&self, req: &PlaceBetRequest) -> Result<PlaceBetResponse, ExecutorError>;

    async fn fetch_bet(&self, round_id: &str) -> Result<PlaceBetResponse, ExecutorError>;

    async fn bet_history(&self, query: &HistoryQuery) -> Result<HistoryResponse, ExecutorError>;

    async fn wallet_balance(&self) -> Result<WalletBalanceResponse, ExecutorError>;

    async fn deposit(&self, req: &WalletTransferRequest) -> Result<WalletTransferResponse, ExecutorError>;

    async fn withdraw(&self, req: &WalletTransferRequest) -> Result<WalletTransferResponse, ExecutorError>;
}

/// Build the executor selected by configuration
pub fn build(config: &ExecutorConfig) -> anyhow::Result<Arc<dyn RequestExecutor>> {
    match config.mode {
        ExecutorMode::Http => {
            let executor = HttpExecutor::new(
                config.base_url.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?;
            if let Some(token) = &config.api_token {
                executor.set_token(token.clone());
            }
            tracing::info!(base_url = %config.base_url, "Using live HTTP executor");
            Ok(Arc::new(executor))
        }
        ExecutorMode::Fixture => {
            let executor = FixtureExecutor::new(config.fixture.clone());
            tracing::info!(seed = config.fixture.seed, "Using fixture executor");
            Ok(Arc::new(executor))
        }
    }
}
