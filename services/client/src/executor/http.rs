//! Live HTTP executor for the game backend
//!
//! Sends JSON over reqwest with a bearer token and maps every failure to an
//! [`ExecutorError`]. Error bodies are parsed from the shared envelope.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::api::{
    CreateSessionRequest, EndSessionRequest, HistoryQuery, HistoryResponse, PlaceBetRequest,
    PlaceBetResponse, SessionResponse, WalletBalanceResponse, WalletTransferRequest,
    WalletTransferResponse,
};
use shared::errors::ErrorEnvelope;
use std::time::Duration;
use tracing::debug;

use super::{ExecutorError, RequestExecutor};

pub struct HttpExecutor {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpExecutor {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ExecutorError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExecutorError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token.read().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<reqwest::Response, ExecutorError> {
        let response = self
            .authorize(builder)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = %status, body = %body, "Backend rejected request");
            return Err(rejection(status, &body));
        }

        Ok(response)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ExecutorError> {
        self.dispatch(builder)
            .await?
            .json::<T>()
            .await
            .map_err(transport_error)
    }
}

fn transport_error(error: reqwest::Error) -> ExecutorError {
    if error.is_timeout() {
        ExecutorError::Timeout
    } else if error.is_decode() {
        ExecutorError::Decode(error.to_string())
    } else {
        ExecutorError::Transport(error.to_string())
    }
}

fn rejection(status: StatusCode, body: &str) -> ExecutorError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ExecutorError::Rejected {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => ExecutorError::Rejected {
            status: status.as_u16(),
            code: format!("HTTP_{}", status.as_u16()),
            message: if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body.to_string()
            },
        },
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    async fn create_session(&self, req: &CreateSessionRequest) -> Result<SessionResponse, ExecutorError> {
        self.send(self.http.post(self.url("/games/sessions")).json(req))
            .await
    }

    async fn end_session(&self, req: &EndSessionRequest) -> Result<(), ExecutorError> {
        self.dispatch(self.http.post(self.url("/games/sessions/end")).json(req))
            .await?;
        Ok(())
    }

    async fn place_bet(&self, req: &PlaceBetRequest) -> Result<PlaceBetResponse, ExecutorError> {
        self.send(self.http.post(self.url("/games/bets")).json(req))
            .await
    }

    async fn fetch_bet(&self, round_id: &str) -> Result<PlaceBetResponse, ExecutorError> {
        self.send(self.http.get(self.url(&format!("/games/bets/{}", round_id))))
            .await
    }

    async fn bet_history(&self, query: &HistoryQuery) -> Result<HistoryResponse, ExecutorError> {
        self.send(self.http.get(self.url("/bets/history")).query(query))
            .await
    }

    async fn wallet_balance(&self) -> Result<WalletBalanceResponse, ExecutorError> {
        self.send(self.http.get(self.url("/wallet/balance"))).await
    }

    async fn deposit(&self, req: &WalletTransferRequest) -> Result<WalletTransferResponse, ExecutorError> {
        self.send(self.http.post(self.url("/wallet/deposit")).json(req))
            .await
    }

    async fn withdraw(&self, req: &WalletTransferRequest) -> Result<WalletTransferResponse, ExecutorError> {
        self.send(self.http.post(self.url("/wallet/withdraw")).json(req))
            .await
    }
}
