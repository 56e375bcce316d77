// Library interface for the fixture backend - exposes modules for testing

pub mod config;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        .route("/health/detailed", get(handlers::health::detailed_health))
        // Sessions
        .route("/games/sessions", post(handlers::sessions::create_session))
        .route("/games/sessions/end", post(handlers::sessions::end_session))
        // Bets
        .route("/games/bets", post(handlers::bets::place_bet))
        .route("/games/bets/:round_id", get(handlers::bets::get_bet))
        .route("/bets/history", get(handlers::history::bet_history))
        // Wallet
        .route("/wallet/balance", get(handlers::wallet::balance))
        .route("/wallet/deposit", post(handlers::wallet::deposit))
        .route("/wallet/withdraw", post(handlers::wallet::withdraw))
        // State
        .with_state(state)
        // Middleware
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
