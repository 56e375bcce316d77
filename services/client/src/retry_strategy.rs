use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use shared::api::{PlaceBetResponse, SettlementPayload};
use std::time::Duration;

use crate::config::WageringConfig;
use crate::executor::{ExecutorError, RequestExecutor};

/// Polling policy for bets the backend settles after the place-bet call
///
/// Only "still pending" answers are retried. A transport or server error
/// while polling ends the bet, so a bet is never resubmitted by the core.
#[derive(Debug, Clone)]
pub struct ResultPollStrategy {
    initial_interval: Duration,
    max_interval: Duration,
    timeout: Duration,
}

#[derive(Debug)]
enum PollFailure {
    Pending,
    Failed(ExecutorError),
}

impl ResultPollStrategy {
    pub fn new(initial_interval: Duration, max_interval: Duration, timeout: Duration) -> Self {
        Self {
            initial_interval,
            max_interval,
            timeout,
        }
    }

    pub fn from_config(config: &WageringConfig) -> Self {
        Self::new(
            Duration::from_millis(config.result_poll_initial_ms),
            Duration::from_millis(config.result_poll_max_ms),
            Duration::from_millis(config.result_timeout_ms),
        )
    }

    pub fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_multiplier(2.0)
            .with_max_elapsed_time(Some(self.timeout))
            .build()
    }

    /// Poll `GET /games/bets/{round_id}` until it settles
    ///
    /// Gives up with [`ExecutorError::Timeout`] once the policy's elapsed-time
    /// budget is spent.
    pub async fn await_settlement(
        &self,
        executor: &dyn RequestExecutor,
        round_id: &str,
    ) -> Result<SettlementPayload, ExecutorError> {
        let outcome = backoff::future::retry(self.create_backoff(), || async move {
            match executor.fetch_bet(round_id).await {
                Ok(PlaceBetResponse::Settled(settlement)) => Ok(settlement),
                Ok(PlaceBetResponse::Pending(_)) => {
                    tracing::debug!(round_id, "Settlement still pending");
                    Err(backoff::Error::transient(PollFailure::Pending))
                }
                Err(e) => Err(backoff::Error::permanent(PollFailure::Failed(e))),
            }
        })
        .await;

        outcome.map_err(|failure| match failure {
            PollFailure::Pending => ExecutorError::Timeout,
            PollFailure::Failed(e) => e,
        })
    }
}

impl Default for ResultPollStrategy {
    fn default() -> Self {
        Self::from_config(&WageringConfig::default())
    }
}
