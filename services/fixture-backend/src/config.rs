use anyhow::Context;
use serde::Deserialize;
use shared::Credits;
use std::env;
use wager_client::config::FixtureSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api_port: u16,
    pub metrics_port: u16,
    /// Bearer token every game and wallet route requires
    pub api_token: String,
    pub fixture: FixtureSettings,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = FixtureSettings::default();

        Ok(Config {
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("API_PORT must be a port number")?,
            metrics_port: env::var("METRICS_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()
                .context("METRICS_PORT must be a port number")?,
            api_token: env::var("API_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "dev-token".to_string()),
            fixture: FixtureSettings {
                seed: env::var("FIXTURE_SEED")
                    .unwrap_or_else(|_| defaults.seed.to_string())
                    .parse()
                    .context("FIXTURE_SEED must be an unsigned integer")?,
                initial_balance: Credits::new(
                    env::var("FIXTURE_INITIAL_BALANCE")
                        .unwrap_or_else(|_| defaults.initial_balance.to_string())
                        .parse()
                        .context("FIXTURE_INITIAL_BALANCE must be an integer")?,
                ),
                deferred_settlement: env::var("FIXTURE_DEFERRED_SETTLEMENT")
                    .unwrap_or_else(|_| "false".to_string())
                    .parse()
                    .context("FIXTURE_DEFERRED_SETTLEMENT must be true or false")?,
            },
        })
    }
}
