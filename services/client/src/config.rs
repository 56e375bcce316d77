use anyhow::Context;
use serde::Deserialize;
use shared::{
    Credits, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_PAGE_SIZE,
    RESULT_POLL_INITIAL_MS, RESULT_POLL_MAX_MS, RESULT_TIMEOUT_MS,
};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub executor: ExecutorConfig,
    pub wagering: WageringConfig,
    pub history: HistoryConfig,
    pub autoplay: AutoplayConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    Http,
    Fixture,
}

impl FromStr for ExecutorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(ExecutorMode::Http),
            "fixture" | "mock" => Ok(ExecutorMode::Fixture),
            other => anyhow::bail!("unknown EXECUTOR_MODE: {}", other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    pub mode: ExecutorMode,
    pub base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub fixture: FixtureSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FixtureSettings {
    pub seed: u64,
    pub initial_balance: Credits,
    pub deferred_settlement: bool,
}

impl Default for FixtureSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            initial_balance: Credits::new(1_000),
            deferred_settlement: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WageringConfig {
    pub result_poll_initial_ms: u64,
    pub result_poll_max_ms: u64,
    pub result_timeout_ms: u64,
}

impl Default for WageringConfig {
    fn default() -> Self {
        Self {
            result_poll_initial_ms: RESULT_POLL_INITIAL_MS,
            result_poll_max_ms: RESULT_POLL_MAX_MS,
            result_timeout_ms: RESULT_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    pub page_size: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoplayConfig {
    pub game_id: String,
    pub spins: u32,
    pub bet_amount: Credits,
}

fn var_or<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("invalid value for {}: {}", key, raw))
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let fixture_defaults = FixtureSettings::default();
        let page_size: u32 = var_or("HISTORY_PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string())?;

        Ok(Config {
            executor: ExecutorConfig {
                mode: var_or("EXECUTOR_MODE", "fixture")?,
                base_url: env::var("API_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3001".to_string()),
                api_token: env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),
                request_timeout_secs: var_or(
                    "REQUEST_TIMEOUT_SECS",
                    &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
                )?,
                fixture: FixtureSettings {
                    seed: var_or("FIXTURE_SEED", &fixture_defaults.seed.to_string())?,
                    initial_balance: Credits::new(var_or(
                        "FIXTURE_INITIAL_BALANCE",
                        &fixture_defaults.initial_balance.to_string(),
                    )?),
                    deferred_settlement: var_or("FIXTURE_DEFERRED_SETTLEMENT", "false")?,
                },
            },
            wagering: WageringConfig {
                result_poll_initial_ms: var_or(
                    "RESULT_POLL_INITIAL_MS",
                    &RESULT_POLL_INITIAL_MS.to_string(),
                )?,
                result_poll_max_ms: var_or("RESULT_POLL_MAX_MS", &RESULT_POLL_MAX_MS.to_string())?,
                result_timeout_ms: var_or("RESULT_TIMEOUT_MS", &RESULT_TIMEOUT_MS.to_string())?,
            },
            history: HistoryConfig {
                page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            },
            autoplay: AutoplayConfig {
                game_id: env::var("GAME_ID").unwrap_or_else(|_| "classic-fruits".to_string()),
                spins: var_or("SPIN_COUNT", "10")?,
                bet_amount: Credits::new(var_or("BET_AMOUNT", "10")?),
            },
        })
    }
}
