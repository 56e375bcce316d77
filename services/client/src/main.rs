use anyhow::{Context, Result};
use shared::Credits;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wager_client::{BetLifecycleState, Config, GameClient, GameError, GameId, ValidationError};

#[tokio::main]
async fn main() -> Result<()> {
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "json".to_string())
        .eq_ignore_ascii_case("json");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wager_client=info,autoplay=info".into());

    if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        service = "autoplay",
        version = env!("CARGO_PKG_VERSION"),
        log_format = if use_json { "json" } else { "text" },
        "Starting autoplay"
    );

    let config = Config::load()?;
    tracing::info!(
        mode = ?config.executor.mode,
        game_id = %config.autoplay.game_id,
        spins = config.autoplay.spins,
        bet_amount = %config.autoplay.bet_amount,
        "Configuration loaded"
    );

    let client = GameClient::from_config(&config)?;
    let game_id = GameId::new(config.autoplay.game_id.clone());
    let session = client
        .ensure_session(&game_id, Some(config.autoplay.bet_amount))
        .await
        .context("failed to open game session")?;
    info!(session_id = %session.session_id, balance = %session.initial_balance, "Session ready");

    play(&client, config.autoplay.spins, config.autoplay.bet_amount).await;

    match client.load_history(1, config.history.page_size, None).await {
        Ok(page) => {
            for item in &page.items {
                println!(
                    "{}  {:<24}  bet {:>6}  win {:>6}  balance {:>8}",
                    item.timestamp.format("%H:%M:%S"),
                    item.result_symbols.join(" "),
                    item.bet_amount,
                    item.win_amount,
                    item.new_balance
                );
            }
            info!(shown = page.items.len(), total = page.total_count, "History loaded");
        }
        Err(e) => warn!(error = %e, "Failed to load history"),
    }

    client.end_session().await;
    info!(balance = ?client.balance(), "Autoplay finished");
    Ok(())
}

async fn play(client: &GameClient, spins: u32, amount: Credits) {
    for spin in 1..=spins {
        match client.spin(amount, None).await {
            Ok(BetLifecycleState::Settled(result)) => {
                info!(
                    spin,
                    bet_id = %result.bet_id,
                    symbols = %result.result_symbols.join(","),
                    win_amount = %result.win_amount,
                    balance = %result.new_balance,
                    "Spin settled"
                );
            }
            Ok(BetLifecycleState::Failed(kind)) => {
                warn!(spin, kind = %kind, "{}", kind.user_message());
            }
            Ok(other) => warn!(spin, state = other.name(), "Spin ended in unexpected state"),
            Err(GameError::Validation(ValidationError::InsufficientBalance { required, available })) => {
                info!(%required, %available, "Balance no longer covers the stake");
                break;
            }
            Err(e) => {
                error!(spin, error = %e, "Spin not placed");
                break;
            }
        }
        client.acknowledge();
    }
}
